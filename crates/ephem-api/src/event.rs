use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ApiError;

/// One invocation of the event trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub records: Vec<TriggerRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub body: String,
}

impl TriggerEvent {
    /// Wrap one body.
    pub fn single(body: impl Into<String>) -> Self {
        Self {
            records: vec![TriggerRecord { body: body.into() }],
        }
    }

    /// The body of the only record.
    ///
    /// Zero or several records break the caller contract and yield [`ApiError::Config`].
    pub fn single_body(&self) -> Result<&str, ApiError> {
        match self.records.as_slice() {
            [record] => Ok(&record.body),
            records => Err(ApiError::Config(format!(
                "event source configuration issue, received {} records",
                records.len()
            ))),
        }
    }

    /// Decode the only record's JSON body.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self.single_body()?;
        serde_json::from_str(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephem_model::LaunchRequest;

    #[test]
    fn exactly_one_record_is_accepted() {
        let ev = TriggerEvent::single("{}");
        assert_eq!(ev.single_body().unwrap(), "{}");
    }

    #[test]
    fn zero_or_many_records_are_config_errors() {
        let none = TriggerEvent::default();
        let two = TriggerEvent {
            records: vec![
                TriggerRecord { body: "{}".into() },
                TriggerRecord { body: "{}".into() },
            ],
        };

        for ev in [none, two] {
            let err = ev.single_body().unwrap_err();
            assert!(matches!(err, ApiError::Config(_)), "{err}");
        }
        assert!(
            TriggerEvent::default()
                .single_body()
                .unwrap_err()
                .to_string()
                .contains("received 0 records")
        );
    }

    #[test]
    fn parse_decodes_body() {
        let ev = TriggerEvent::single(
            r#"{"id":5,"owner":"acme","repository":"widgets","labels":["self-hosted","vm"]}"#,
        );
        let req: LaunchRequest = ev.parse().unwrap();
        assert_eq!(req.id, 5);
        assert_eq!(req.labels.len(), 2);
    }

    #[test]
    fn parse_rejects_malformed_body() {
        let ev = TriggerEvent::single("not json");
        assert!(matches!(
            ev.parse::<LaunchRequest>(),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
