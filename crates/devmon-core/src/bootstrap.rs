//! Connection bootstrap
//!
//! Two mutually exclusive provisioning strategies resolve into one open
//! session: a pre-built connection string, or a DPS-style enrollment that
//! exchanges a symmetric key and scope identifier for an assigned hub.

use crate::error::AgentError;
use crate::session::{RegistrationStatus, Session, Transport};
use tracing::{error, info};

/// Required keys of a provisioning settings string, in canonical order.
const PROVISIONING_KEYS: [&str; 4] = ["GlobalEndpoint", "IDScope", "DeviceId", "SharedAccessKey"];

const PROVISIONING_FORMAT: &str =
    "settings should be \"GlobalEndpoint=...;IDScope=...;DeviceId=...;SharedAccessKey=...\"";

/// Resolved startup parameters. Exactly one variant per run, selected once
/// at startup and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapParameters {
    /// Connect directly with a pre-built connection string.
    Manual { connection_string: String },

    /// Enroll against a provisioning endpoint before connecting.
    Provisioned {
        global_endpoint: String,
        id_scope: String,
        device_id: String,
        symmetric_key: String,
    },
}

impl BootstrapParameters {
    /// Resolve `(mode, settings)` startup input into parameters.
    ///
    /// `manual` takes the settings verbatim as the connection string.
    /// `dps` expects exactly four `;`-separated `key=value` fields
    /// covering `GlobalEndpoint`, `IDScope`, `DeviceId` and
    /// `SharedAccessKey` in any order; a value is everything
    /// after the field's first `=`, so base64 padding survives. Unknown
    /// fields are rejected, not dropped.
    pub fn from_mode_and_settings(mode: &str, settings: &str) -> Result<Self, AgentError> {
        match mode {
            "manual" => {
                if settings.is_empty() {
                    return Err(AgentError::InvalidConfiguration(
                        "manual mode requires a non-empty connection string".to_string(),
                    ));
                }
                Ok(Self::Manual {
                    connection_string: settings.to_string(),
                })
            }
            "dps" => Self::parse_provisioning_settings(settings),
            other => Err(AgentError::InvalidConfiguration(format!(
                "mode should be 'manual' or 'dps', got '{other}'"
            ))),
        }
    }

    fn parse_provisioning_settings(settings: &str) -> Result<Self, AgentError> {
        let fields: Vec<&str> = settings.split(';').collect();
        if fields.len() != PROVISIONING_KEYS.len() {
            return Err(AgentError::InvalidConfiguration(format!(
                "{PROVISIONING_FORMAT}, got {} fields",
                fields.len()
            )));
        }

        let mut values: [Option<&str>; 4] = [None; 4];
        for field in fields {
            let Some((key, value)) = field.split_once('=') else {
                return Err(AgentError::InvalidConfiguration(format!(
                    "field '{field}' is not a key=value pair"
                )));
            };
            match PROVISIONING_KEYS.iter().position(|known| *known == key) {
                Some(index) => values[index] = Some(value),
                None => {
                    return Err(AgentError::InvalidConfiguration(format!(
                        "unrecognized field '{key}'; {PROVISIONING_FORMAT}"
                    )))
                }
            }
        }

        match values {
            [Some(global_endpoint), Some(id_scope), Some(device_id), Some(symmetric_key)] => {
                Ok(Self::Provisioned {
                    global_endpoint: global_endpoint.to_string(),
                    id_scope: id_scope.to_string(),
                    device_id: device_id.to_string(),
                    symmetric_key: symmetric_key.to_string(),
                })
            }
            _ => {
                let missing = PROVISIONING_KEYS
                    .iter()
                    .zip(&values)
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| *key)
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(AgentError::InvalidConfiguration(format!(
                    "missing required key(s) {missing}; {PROVISIONING_FORMAT}"
                )))
            }
        }
    }
}

/// Resolve parameters into an open session tagged with `model_id`.
///
/// The provisioned path registers first and treats any status other than
/// `Assigned` as a fatal registration failure for this run.
pub async fn establish_session(
    params: &BootstrapParameters,
    transport: &dyn Transport,
    model_id: &str,
) -> Result<Box<dyn Session>, AgentError> {
    match params {
        BootstrapParameters::Manual { connection_string } => {
            info!("opening session from connection string");
            Ok(transport
                .open_from_connection_string(connection_string, model_id)
                .await?)
        }
        BootstrapParameters::Provisioned {
            global_endpoint,
            id_scope,
            device_id,
            symmetric_key,
        } => {
            info!(%global_endpoint, %id_scope, %device_id, "registering device via provisioning service");
            let registration = transport
                .register_device(global_endpoint, id_scope, device_id, symmetric_key)
                .await?;
            if registration.status != RegistrationStatus::Assigned {
                error!(status = %registration.status, "registration failed");
                return Err(AgentError::RegistrationFailure {
                    status: registration.status,
                });
            }
            info!(assigned_hub = %registration.assigned_hub, "device assigned");
            Ok(transport
                .open(
                    &registration.assigned_hub,
                    &registration.device_id,
                    symmetric_key,
                    model_id,
                )
                .await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_settings_verbatim() {
        let params =
            BootstrapParameters::from_mode_and_settings("manual", "HostName=h;DeviceId=d").unwrap();
        assert_eq!(
            params,
            BootstrapParameters::Manual {
                connection_string: "HostName=h;DeviceId=d".to_string()
            }
        );
    }

    #[test]
    fn test_provisioning_value_keeps_later_equals() {
        let params = BootstrapParameters::from_mode_and_settings(
            "dps",
            "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1;SharedAccessKey=abc==",
        )
        .unwrap();
        let BootstrapParameters::Provisioned { symmetric_key, .. } = params else {
            panic!("expected provisioned parameters");
        };
        assert_eq!(symmetric_key, "abc==");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = BootstrapParameters::from_mode_and_settings("auto", "x").unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfiguration(_)));
    }
}
