//! Answer synthesis prompt

use crate::answer::AnswerData;
use crate::insights::Insights;
use crate::table::{CellValue, TabularResult};

/// Rows of each table included verbatim in the prompt
pub const MAX_PROMPT_ROWS: usize = 50;

pub const SYSTEM_PROMPT: &str = "You are a web analytics and technical SEO analyst. \
    Answer the user's question using only the data provided. Quote concrete numbers \
    and page URLs from the data. Keep the answer short and say plainly when the data \
    is empty or does not answer the question.";

pub fn build_prompt(text: &str, data: &AnswerData, insights: &Insights) -> String {
    let shown = data.truncated(MAX_PROMPT_ROWS);
    let payload = serde_json::to_string_pretty(&shown).unwrap_or_else(|_| "{}".to_string());

    let mut prompt = format!("Question: \"{}\"\n\n", text);
    match data {
        AnswerData::Table(table) => {
            prompt.push_str(&format!("Rows returned: {}\n", table.row_count));
            let totals = numeric_totals(table);
            if !totals.is_empty() {
                prompt.push_str(&format!("Column totals: {}\n", totals.join(", ")));
            }
            if table.row_count > MAX_PROMPT_ROWS {
                prompt.push_str(&format!("Only the first {} rows are shown.\n", MAX_PROMPT_ROWS));
            }
        }
        AnswerData::Fused(fused) => {
            prompt.push_str(&format!(
                "Pages joined across analytics and crawl data: {}\n",
                fused.row_count
            ));
            prompt.push_str(&format!(
                "Pages found in both sources: {}\n",
                fused.joined_count()
            ));
            prompt.push_str(
                "Fields are prefixed with their source; `missing` lists sources with no row for that page.\n",
            );
            if fused.row_count > MAX_PROMPT_ROWS {
                prompt.push_str(&format!(
                    "Only {} pages are shown, pages found in both sources first.\n",
                    MAX_PROMPT_ROWS
                ));
            }
        }
    }

    let findings = insights.lines();
    if !findings.is_empty() {
        prompt.push_str("\nComputed from the full data, mention when relevant:\n");
        for line in findings {
            prompt.push_str(&line);
            prompt.push('\n');
        }
    }
    prompt.push_str(&format!("\nData:\n{}\n\nAnswer:", payload));
    prompt
}

/// `column=sum` for every column holding only numeric cells
fn numeric_totals(table: &TabularResult) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|col| {
            !table.rows.is_empty()
                && table
                    .rows
                    .iter()
                    .all(|row| matches!(row.get(col.as_str()), Some(CellValue::Number(_))))
        })
        .map(|col| format!("{}={}", col, CellValue::Number(table.sum(col))))
        .collect()
}
