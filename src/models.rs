use serde::{Deserialize, Serialize};

// ============ Credit Pro wire types ============

/// Response of `POST {base}/authentication`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    /// Expiry timestamp as returned by the provider. The token is owned by a
    /// single batch run and is never refreshed mid-run; expiry during a long
    /// run surfaces as ordinary per-CPF failures.
    pub expires: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub document: String,
    pub criterion: u32,
}

/// One named score entry in a transaction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderScore {
    pub name: String,
    pub value: Option<String>,
}

/// Raw transaction response. The provider is loose about which scores it
/// returns, so everything beyond the document echo is a name/value list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub scores: Vec<ProviderScore>,
}

// ============ Internal record ============

/// Fixed per-CPF result record mapped from a transaction response.
///
/// Every score field is `None` when the provider did not return a value
/// under the corresponding name. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRecord {
    pub id: String,
    pub document: Option<String>,
    pub score_v3: Option<String>,
    pub persona_bancarizada: Option<String>,
    pub persona_presenca_digital: Option<String>,
    pub persona_banco: Option<String>,
    pub persona_categoria_cartao: Option<String>,
    #[serde(rename = "flagVAVR")]
    pub flag_va_vr: Option<String>,
    pub consumo_geral: Option<String>,
    pub magazine: Option<String>,
    pub delivery: Option<String>,
    pub vestuario: Option<String>,
    pub esportes: Option<String>,
    pub farmacia: Option<String>,
    pub casa: Option<String>,
    pub cosmeticos: Option<String>,
    pub eletronicos: Option<String>,
    pub mercados: Option<String>,
    pub pets: Option<String>,
    pub lazer: Option<String>,
}

// ============ Batch outcomes ============

/// Why a CPF ended up without a record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CpfFailure {
    /// All attempts failed; carries the attempt count and the last provider
    /// status observed, if any.
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
    },
}

/// Structured per-CPF outcome kept by the orchestrator for operability.
/// The HTTP contract only exposes the compacted success list, but failures
/// are logged with their reason instead of vanishing silently.
#[derive(Debug, Clone, Serialize)]
pub struct CpfOutcome {
    pub cpf: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<CpfFailure>,
}

/// Aggregated result of one batch run.
#[derive(Debug)]
pub struct BatchResult {
    /// Successful records, group order preserved, settle order within groups.
    pub records: Vec<CreditRecord>,
    /// One outcome per input CPF, input order preserved across groups.
    pub outcomes: Vec<CpfOutcome>,
    pub cpfs_processed: usize,
}

// ============ HTTP DTOs ============

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReportRequest {
    pub cpfs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub html: String,
    pub filename: String,
    pub json_filename: String,
    pub cpfs_processed: usize,
    pub cpfs_with_data: usize,
}
