//! HTML report rendering and persistence.
//!
//! Turns the aggregated record list into a self-contained HTML document
//! (masked CPFs, score color classes, embedded raw JSON for download) and
//! writes both the document and a raw JSON archive to the reports directory.

use crate::errors::AppError;
use crate::models::{CreditRecord, ReportResponse};
use chrono::Local;
use regex::Regex;
use std::path::Path;

/// Rows are rendered in chunks to keep peak allocation flat on large batches.
const ROW_CHUNK_SIZE: usize = 100;

/// Masks the middle digits of an 11-digit CPF: `12345678901` → `123.***.***-01`.
/// Anything that is not 11 digits is returned unchanged.
pub fn mask_cpf(cpf: &str) -> String {
    let re = Regex::new(r"^(\d{3})\d{6}(\d{2})$").unwrap();
    re.replace(cpf, "$1.***.***-$2").into_owned()
}

/// CSS class for a score cell. Primary scores and consumption potentials
/// use different thresholds.
pub fn score_class(value: Option<&str>, is_consumption: bool) -> &'static str {
    let Some(num) = value.and_then(|v| v.parse::<i64>().ok()) else {
        return "";
    };

    if is_consumption {
        match num {
            n if n >= 70 => "score-high",
            n if n >= 40 => "score-medium",
            _ => "score-low",
        }
    } else {
        match num {
            n if n >= 500 => "score-high",
            n if n >= 200 => "score-medium",
            _ => "score-low",
        }
    }
}

fn cell(value: Option<&str>) -> String {
    format!("<td>{}</td>", value.unwrap_or("-"))
}

fn score_cell(value: Option<&str>, is_consumption: bool) -> String {
    match value {
        Some(v) => format!(
            "<td class=\"{}\">{}</td>",
            score_class(Some(v), is_consumption),
            v
        ),
        None => "<td>-</td>".to_string(),
    }
}

fn render_row(record: &CreditRecord) -> String {
    let short_id: String = record.id.chars().take(8).collect();
    let document = record
        .document
        .as_deref()
        .map(mask_cpf)
        .unwrap_or_else(|| "-".to_string());

    let mut row = String::from("<tr>");
    row.push_str(&format!(
        "<td><div class=\"document-id\">{}...</div></td>",
        short_id
    ));
    row.push_str(&format!("<td><div class=\"cpf\">{}</div></td>", document));
    row.push_str(&score_cell(record.score_v3.as_deref(), false));
    row.push_str(&cell(record.persona_bancarizada.as_deref()));
    row.push_str(&cell(record.persona_presenca_digital.as_deref()));
    row.push_str(&cell(record.persona_banco.as_deref()));
    row.push_str(&cell(record.persona_categoria_cartao.as_deref()));
    row.push_str(&cell(record.flag_va_vr.as_deref()));
    for value in [
        record.consumo_geral.as_deref(),
        record.magazine.as_deref(),
        record.delivery.as_deref(),
        record.vestuario.as_deref(),
        record.esportes.as_deref(),
        record.farmacia.as_deref(),
        record.casa.as_deref(),
        record.cosmeticos.as_deref(),
        record.eletronicos.as_deref(),
        record.mercados.as_deref(),
        record.pets.as_deref(),
        record.lazer.as_deref(),
    ] {
        row.push_str(&score_cell(value, true));
    }
    row.push_str("</tr>");
    row
}

/// Renders the full report document for the given records.
pub fn generate_html(records: &[CreditRecord]) -> String {
    tracing::info!("Generating HTML report for {} record(s)", records.len());

    let mut table_rows = String::new();
    for (idx, chunk) in records.chunks(ROW_CHUNK_SIZE).enumerate() {
        tracing::debug!("Rendering row chunk {} ({} records)", idx + 1, chunk.len());
        for record in chunk {
            table_rows.push_str(&render_row(record));
            table_rows.push('\n');
        }
    }

    // Compact JSON for large datasets keeps the embedded payload small.
    let data_json = if records.len() > 100 {
        serde_json::to_string(records)
    } else {
        serde_json::to_string_pretty(records)
    }
    .unwrap_or_else(|_| "[]".to_string());

    let with_score = records.iter().filter(|r| r.score_v3.is_some()).count();
    let generated_at = Local::now().format("%d/%m/%Y %H:%M");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Análise dos Scores por Documento</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }}
        .container {{ max-width: 100%; margin: 0 auto; background: white; border-radius: 10px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); overflow: hidden; }}
        .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; }}
        .header h1 {{ margin: 0; font-size: 2.5rem; font-weight: 300; }}
        .header p {{ margin: 10px 0 0 0; opacity: 0.9; font-size: 1.1rem; }}
        .stats {{ display: flex; justify-content: space-around; background: #f8f9fa; padding: 20px; border-bottom: 1px solid #dee2e6; }}
        .stat {{ text-align: center; }}
        .stat .value {{ font-size: 1.8rem; font-weight: bold; color: #667eea; }}
        .stat .label {{ color: #6c757d; font-size: 0.9rem; }}
        .table-wrapper {{ overflow-x: auto; padding: 20px; }}
        table {{ width: 100%; border-collapse: collapse; font-size: 0.85rem; }}
        th {{ background: #667eea; color: white; padding: 10px 8px; text-align: left; position: sticky; top: 0; white-space: nowrap; }}
        td {{ padding: 8px; border-bottom: 1px solid #dee2e6; white-space: nowrap; }}
        tr:hover {{ background-color: #f8f9fa; }}
        .document-id {{ font-family: monospace; color: #6c757d; }}
        .cpf {{ font-family: monospace; font-weight: bold; }}
        .score-high {{ color: #28a745; font-weight: bold; }}
        .score-medium {{ color: #ffc107; font-weight: bold; }}
        .score-low {{ color: #dc3545; font-weight: bold; }}
        .toolbar {{ padding: 15px 20px; text-align: right; }}
        .toolbar button {{ background: #667eea; color: white; border: none; padding: 10px 20px; border-radius: 5px; cursor: pointer; font-size: 0.9rem; }}
        .toolbar button:hover {{ background: #5a6fd8; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Análise dos Scores</h1>
            <p>Consulta Credit Pro — gerado em {generated_at}</p>
        </div>
        <div class="stats">
            <div class="stat"><div class="value">{total}</div><div class="label">Documentos</div></div>
            <div class="stat"><div class="value">{with_score}</div><div class="label">Com Score v3</div></div>
        </div>
        <div class="toolbar">
            <button onclick="downloadJson()">Baixar dados (JSON)</button>
        </div>
        <div class="table-wrapper">
            <table>
                <thead>
                    <tr>
                        <th>ID</th><th>CPF</th><th>Score v3</th><th>Bancarizada</th>
                        <th>Presença Digital</th><th>Banco</th><th>Cat. Cartão</th><th>VA/VR</th>
                        <th>Geral</th><th>Magazine</th><th>Delivery</th><th>Vestuário</th>
                        <th>Esportes</th><th>Farmácia</th><th>Casa</th><th>Cosméticos</th>
                        <th>Eletrônicos</th><th>Mercados</th><th>Pets</th><th>Lazer</th>
                    </tr>
                </thead>
                <tbody>
{table_rows}
                </tbody>
            </table>
        </div>
    </div>
    <script>
        const reportData = {data_json};
        function downloadJson() {{
            const blob = new Blob([JSON.stringify(reportData, null, 2)], {{ type: 'application/json' }});
            const url = URL.createObjectURL(blob);
            const a = document.createElement('a');
            a.href = url;
            a.download = 'dados-scores.json';
            a.click();
            URL.revokeObjectURL(url);
        }}
    </script>
</body>
</html>
"#,
        generated_at = generated_at,
        total = records.len(),
        with_score = with_score,
        table_rows = table_rows,
        data_json = data_json,
    );

    tracing::info!(
        "HTML report generated ({} KB)",
        html.len() / 1024
    );
    html
}

/// Persists the report document and its raw JSON archive.
///
/// The reports directory is created if missing. Filenames are timestamped so
/// consecutive runs never overwrite each other.
pub async fn save_report(
    html: String,
    records: &[CreditRecord],
    cpfs_processed: usize,
    reports_dir: &str,
) -> Result<ReportResponse, AppError> {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    let filename = format!("relatorio-scores-{}.html", timestamp);
    let json_filename = format!("dados-scores-{}.json", timestamp);

    tokio::fs::create_dir_all(reports_dir).await.map_err(|e| {
        AppError::InternalError(format!(
            "Failed to create reports directory {}: {}",
            reports_dir, e
        ))
    })?;

    let html_path = Path::new(reports_dir).join(&filename);
    tokio::fs::write(&html_path, &html)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write report file: {}", e)))?;

    let raw = serde_json::to_string_pretty(records)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize records: {}", e)))?;
    let json_path = Path::new(reports_dir).join(&json_filename);
    tokio::fs::write(&json_path, raw)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write JSON archive: {}", e)))?;

    tracing::info!("Report saved: {} / {}", filename, json_filename);

    Ok(ReportResponse {
        html,
        filename,
        json_filename,
        cpfs_processed,
        cpfs_with_data: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, document: Option<&str>, score: Option<&str>) -> CreditRecord {
        CreditRecord {
            id: id.to_string(),
            document: document.map(String::from),
            score_v3: score.map(String::from),
            persona_bancarizada: None,
            persona_presenca_digital: None,
            persona_banco: None,
            persona_categoria_cartao: None,
            flag_va_vr: None,
            consumo_geral: None,
            magazine: None,
            delivery: None,
            vestuario: None,
            esportes: None,
            farmacia: None,
            casa: None,
            cosmeticos: None,
            eletronicos: None,
            mercados: None,
            pets: None,
            lazer: None,
        }
    }

    #[test]
    fn mask_hides_middle_digits() {
        assert_eq!(mask_cpf("12345678901"), "123.***.***-01");
    }

    #[test]
    fn mask_leaves_non_cpf_strings_alone() {
        assert_eq!(mask_cpf("123"), "123");
        assert_eq!(mask_cpf("not-a-cpf"), "not-a-cpf");
    }

    #[test]
    fn score_classes_use_primary_thresholds() {
        assert_eq!(score_class(Some("640"), false), "score-high");
        assert_eq!(score_class(Some("350"), false), "score-medium");
        assert_eq!(score_class(Some("100"), false), "score-low");
        assert_eq!(score_class(None, false), "");
        assert_eq!(score_class(Some("abc"), false), "");
    }

    #[test]
    fn score_classes_use_consumption_thresholds() {
        assert_eq!(score_class(Some("75"), true), "score-high");
        assert_eq!(score_class(Some("50"), true), "score-medium");
        assert_eq!(score_class(Some("10"), true), "score-low");
    }

    #[test]
    fn html_contains_masked_cpf_and_stats() {
        let records = vec![
            record("abc123456789", Some("11111111111"), Some("640")),
            record("def", None, None),
        ];
        let html = generate_html(&records);

        assert!(html.contains("111.***.***-11"));
        // Full CPF never appears in the document body rows.
        assert!(!html.contains("<div class=\"cpf\">11111111111</div>"));
        assert!(html.contains("abc12345..."));
        assert!(html.contains("score-high"));
    }
}
