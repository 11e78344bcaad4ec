//! Settings-parsing properties for the two bootstrap strategies

use devmon_core::{AgentError, BootstrapParameters};
use proptest::prelude::*;

#[test]
fn test_manual_uses_settings_verbatim() {
    let params = BootstrapParameters::from_mode_and_settings(
        "manual",
        "HostName=h;DeviceId=d;SharedAccessKey=k",
    )
    .unwrap();
    assert_eq!(
        params,
        BootstrapParameters::Manual {
            connection_string: "HostName=h;DeviceId=d;SharedAccessKey=k".to_string()
        }
    );
}

#[test]
fn test_manual_rejects_empty_settings() {
    let err = BootstrapParameters::from_mode_and_settings("manual", "").unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

#[test]
fn test_provisioning_parses_all_four_keys() {
    let params = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1;SharedAccessKey=abc=",
    )
    .unwrap();
    assert_eq!(
        params,
        BootstrapParameters::Provisioned {
            global_endpoint: "https://g".to_string(),
            id_scope: "0ne00".to_string(),
            device_id: "dev1".to_string(),
            symmetric_key: "abc=".to_string(),
        }
    );
}

#[test]
fn test_provisioning_rejects_missing_key() {
    // three fields, before any network call
    let err = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1",
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

#[test]
fn test_provisioning_rejects_fifth_unknown_field() {
    let err = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1;SharedAccessKey=k;Extra=1",
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

#[test]
fn test_provisioning_rejects_unknown_key_at_right_count() {
    let err = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1;Password=k",
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

#[test]
fn test_provisioning_rejects_duplicate_key() {
    let err = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;GlobalEndpoint=https://h;DeviceId=dev1;SharedAccessKey=k",
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

#[test]
fn test_provisioning_rejects_field_without_delimiter() {
    let err = BootstrapParameters::from_mode_and_settings(
        "dps",
        "GlobalEndpoint=https://g;IDScope=0ne00;DeviceId=dev1;SharedAccessKey",
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::InvalidConfiguration(_)));
}

proptest! {
    /// Well-formed settings parse to the same four values in any field
    /// order, with arbitrary `=` characters inside values.
    #[test]
    fn test_parse_is_order_independent(
        endpoint in "[a-z0-9.:/-]{1,24}",
        scope in "[A-Za-z0-9]{1,12}",
        device in "[a-z0-9-]{1,12}",
        key in "[A-Za-z0-9+/=]{1,24}",
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let fields = [
            format!("GlobalEndpoint={endpoint}"),
            format!("IDScope={scope}"),
            format!("DeviceId={device}"),
            format!("SharedAccessKey={key}"),
        ];
        let settings = order
            .iter()
            .map(|&i| fields[i].as_str())
            .collect::<Vec<_>>()
            .join(";");

        let params = BootstrapParameters::from_mode_and_settings("dps", &settings).unwrap();
        prop_assert_eq!(
            params,
            BootstrapParameters::Provisioned {
                global_endpoint: endpoint,
                id_scope: scope,
                device_id: device,
                symmetric_key: key,
            }
        );
    }

    /// Dropping any one required field always fails.
    #[test]
    fn test_any_missing_key_fails(drop_index in 0usize..4) {
        let fields = [
            "GlobalEndpoint=https://g",
            "IDScope=0ne00",
            "DeviceId=dev1",
            "SharedAccessKey=abc=",
        ];
        let settings = fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != drop_index)
            .map(|(_, f)| *f)
            .collect::<Vec<_>>()
            .join(";");

        let err = BootstrapParameters::from_mode_and_settings("dps", &settings).unwrap_err();
        prop_assert!(matches!(err, AgentError::InvalidConfiguration(_)));
    }
}
