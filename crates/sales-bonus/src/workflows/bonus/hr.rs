use serde_json::json;

use super::domain::EmployeeId;
use crate::config::OrangeHrmConfig;

/// Outbound HR system boundary: persist an approved yearly total in the
/// employee master data tenant.
pub trait ExternalHrClient: Send + Sync {
    fn store_total_bonus(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        total_bonus_eur: f64,
    ) -> Result<(), HrStoreError>;
}

/// Failure pushing to the HR tenant. Both variants are safe to retry by
/// re-invoking the workflow action; the local approval is never rolled back.
#[derive(Debug, thiserror::Error)]
pub enum HrStoreError {
    #[error("orangehrm unreachable: {0}")]
    Transport(String),
    #[error("orangehrm rejected bonus store (http {status})")]
    Rejected { status: u16 },
}

/// HTTP client for an OrangeHRM tenant. Endpoint templates and the bearer
/// token come from configuration since tenants differ between deployments.
pub struct OrangeHrmClient {
    agent: ureq::Agent,
    base_url: String,
    api_token: Option<String>,
    store_bonus_endpoint: String,
}

impl OrangeHrmClient {
    pub fn new(config: &OrangeHrmConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.timeout)
            .timeout(config.timeout)
            .build();

        Self {
            agent,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
            store_bonus_endpoint: config.store_bonus_endpoint.clone(),
        }
    }

    fn store_bonus_url(&self, employee_id: &EmployeeId) -> String {
        let path = fill_template(&self.store_bonus_endpoint, "employeeId", employee_id.as_str());
        format!("{}{path}", self.base_url)
    }
}

impl ExternalHrClient for OrangeHrmClient {
    fn store_total_bonus(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        total_bonus_eur: f64,
    ) -> Result<(), HrStoreError> {
        let mut request = self.agent.post(&self.store_bonus_url(employee_id));
        if let Some(token) = &self.api_token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let payload = json!({
            "employeeId": employee_id.as_str(),
            "year": year,
            "totalBonusEur": total_bonus_eur,
        });

        match request.send_json(payload) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, _)) => Err(HrStoreError::Rejected { status }),
            Err(err) => Err(HrStoreError::Transport(err.to_string())),
        }
    }
}

/// Replace one `{name}` placeholder with a percent-encoded value. Endpoint
/// templates only ever carry the employee id.
fn fill_template(template: &str, name: &str, value: &str) -> String {
    let encoded: String = value
        .bytes()
        .flat_map(|byte| {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
                vec![byte as char]
            } else {
                format!("%{byte:02X}").chars().collect()
            }
        })
        .collect();

    template.replace(&format!("{{{name}}}"), &encoded)
}
