use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    AuthRequest, AuthToken, CreditRecord, TransactionRequest, TransactionResponse,
};
use std::time::Duration;

/// Client for the Credit Pro scoring API.
///
/// Holds the provider credentials; a bearer token is obtained once per batch
/// run via [`authenticate`](CreditProClient::authenticate) and passed into
/// each [`fetch_credit_data`](CreditProClient::fetch_credit_data) call.
#[derive(Clone)]
pub struct CreditProClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    criterion: u32,
}

/// Strips every non-digit character from a CPF, preserving order.
///
/// No length or checksum validation: a short result is still attempted
/// against the provider, which rejects it on its own terms.
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Provider score names looked up during response mapping, in record order.
/// A name missing from the response yields an absent field, never an error.
const SCORE_NAMES: [&str; 18] = [
    "Score v3",
    "Persona Bancarizada",
    "Persona Presenca Digital",
    "Persona Banco",
    "Persona Categoria cartao",
    "Flag VA/VR",
    "Potencial de consumo - Geral",
    "Potencial de consumo - Magazine",
    "Potencial de consumo - Delivery",
    "Potencial de consumo - Vestuario e acessorios",
    "Potencial de consumo - Lojas esportivas",
    "Potencial de consumo - Farmacia e suplementos",
    "Potencial de consumo - Casa",
    "Potencial de consumo - Cosmeticos e Perfumaria",
    "Potencial de consumo - Eletronicos e papelaria",
    "Potencial de consumo - Mercados",
    "Potencial de consumo - Lojas de pets",
    "Potencial de consumo - Lazer e entretenimento",
];

impl CreditProClient {
    /// Creates a new `CreditProClient` from the application configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::gateway(format!("Failed to create Credit Pro client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.credit_pro_base_url.clone(),
            username: config.credit_pro_user.clone(),
            password: config.credit_pro_pass.clone(),
            criterion: config.credit_pro_criterion,
        })
    }

    /// Exchanges the configured credentials for a time-limited bearer token.
    ///
    /// Called exactly once per batch run. Any failure here aborts the whole
    /// run before per-CPF work starts.
    pub async fn authenticate(&self) -> Result<AuthToken, AppError> {
        let url = format!("{}/authentication", self.base_url);
        tracing::info!("Authenticating against Credit Pro: {}", url);

        let body = AuthRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::gateway(format!("Credit Pro authentication request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::gateway(format!(
                "Credit Pro authentication returned {}: {}",
                status, error_text
            )));
        }

        let token: AuthToken = response.json().await.map_err(|e| {
            AppError::gateway(format!("Failed to parse authentication response: {}", e))
        })?;

        tracing::info!("✓ Credit Pro authentication succeeded");
        Ok(token)
    }

    /// Performs one scoring lookup for a single CPF.
    ///
    /// The CPF is normalized before the request. Non-success responses carry
    /// the provider status code so the retry layer can log it.
    pub async fn fetch_credit_data(
        &self,
        token: &str,
        cpf: &str,
    ) -> Result<CreditRecord, AppError> {
        let document = normalize_cpf(cpf);
        let url = format!("{}/creditpro/transaction", self.base_url);
        tracing::debug!("Fetching credit data for document: {}", document);

        let body = TransactionRequest {
            document,
            criterion: self.criterion,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ProviderError {
                status: e.status().map(|s| s.as_u16()),
                message: format!("Credit Pro transaction request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderError {
                status: Some(status.as_u16()),
                message: format!("Credit Pro returned {}: {}", status, error_text),
            });
        }

        let data: TransactionResponse = response.json().await.map_err(|e| {
            AppError::gateway(format!("Failed to parse transaction response: {}", e))
        })?;

        Ok(map_transaction(data))
    }
}

/// Maps a raw transaction response into the fixed internal record.
///
/// Lookup is by exact score name; missing names default to `None` and a
/// missing id defaults to the `"N/A"` sentinel. Deterministic: the same
/// response always yields an identical record.
pub fn map_transaction(data: TransactionResponse) -> CreditRecord {
    let find = |name: &str| -> Option<String> {
        data.scores
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.value.clone())
            .filter(|v| !v.is_empty())
    };

    CreditRecord {
        id: data.id.clone().unwrap_or_else(|| "N/A".to_string()),
        document: data.document.clone(),
        score_v3: find(SCORE_NAMES[0]),
        persona_bancarizada: find(SCORE_NAMES[1]),
        persona_presenca_digital: find(SCORE_NAMES[2]),
        persona_banco: find(SCORE_NAMES[3]),
        persona_categoria_cartao: find(SCORE_NAMES[4]),
        flag_va_vr: find(SCORE_NAMES[5]),
        consumo_geral: find(SCORE_NAMES[6]),
        magazine: find(SCORE_NAMES[7]),
        delivery: find(SCORE_NAMES[8]),
        vestuario: find(SCORE_NAMES[9]),
        esportes: find(SCORE_NAMES[10]),
        farmacia: find(SCORE_NAMES[11]),
        casa: find(SCORE_NAMES[12]),
        cosmeticos: find(SCORE_NAMES[13]),
        eletronicos: find(SCORE_NAMES[14]),
        mercados: find(SCORE_NAMES[15]),
        pets: find(SCORE_NAMES[16]),
        lazer: find(SCORE_NAMES[17]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderScore;

    fn score(name: &str, value: &str) -> ProviderScore {
        ProviderScore {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_cpf("222.222.222-22"), "22222222222");
        assert_eq!(normalize_cpf("11111111111"), "11111111111");
        assert_eq!(normalize_cpf("abc"), "");
    }

    #[test]
    fn normalize_preserves_digit_order() {
        assert_eq!(normalize_cpf("1a2b3c"), "123");
    }

    #[test]
    fn short_cpf_still_normalized() {
        // Fewer than 11 digits is not rejected here; the provider decides.
        assert_eq!(normalize_cpf("123.456"), "123456");
    }

    #[test]
    fn mapping_finds_scores_by_exact_name() {
        let data = TransactionResponse {
            id: Some("tx-1".to_string()),
            document: Some("11111111111".to_string()),
            scores: vec![
                score("Score v3", "640"),
                score("Persona Banco", "Itau"),
                score("Potencial de consumo - Mercados", "72"),
            ],
        };

        let record = map_transaction(data);
        assert_eq!(record.id, "tx-1");
        assert_eq!(record.document.as_deref(), Some("11111111111"));
        assert_eq!(record.score_v3.as_deref(), Some("640"));
        assert_eq!(record.persona_banco.as_deref(), Some("Itau"));
        assert_eq!(record.mercados.as_deref(), Some("72"));
        // Names not present in the response come back absent.
        assert_eq!(record.persona_bancarizada, None);
        assert_eq!(record.lazer, None);
    }

    #[test]
    fn mapping_defaults_missing_id_to_sentinel() {
        let data = TransactionResponse {
            id: None,
            document: None,
            scores: vec![],
        };

        let record = map_transaction(data);
        assert_eq!(record.id, "N/A");
        assert_eq!(record.document, None);
    }

    #[test]
    fn mapping_treats_empty_value_as_absent() {
        let data = TransactionResponse {
            id: Some("tx-2".to_string()),
            document: None,
            scores: vec![ProviderScore {
                name: "Score v3".to_string(),
                value: Some(String::new()),
            }],
        };

        assert_eq!(map_transaction(data).score_v3, None);
    }

    #[test]
    fn mapping_is_deterministic() {
        let data = TransactionResponse {
            id: Some("tx-3".to_string()),
            document: Some("22222222222".to_string()),
            scores: vec![score("Score v3", "512"), score("Flag VA/VR", "SIM")],
        };

        let a = map_transaction(data.clone());
        let b = map_transaction(data);
        assert_eq!(a, b);
    }
}
