use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";

fn default_app_config() -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "appName": "SlothOrganize",
        "timezone": DEFAULT_TIMEZONE,
        "aiModel": DEFAULT_AI_MODEL
    })
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_app_config())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn read_timezone(config_dir: &Path) -> Result<Tz, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let name = app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_TIMEZONE);
    name.parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone '{name}' in {APP_JSON}")))
}

pub fn read_ai_model(config_dir: &Path) -> Result<String, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let model = app
        .get("aiModel")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_AI_MODEL);
    Ok(model.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config_dir(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "slothorganize-config-{label}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&path).expect("create config dir");
        path
    }

    #[test]
    fn ensure_default_configs_writes_app_json_once() {
        let dir = temp_config_dir("defaults");
        ensure_default_configs(&dir).expect("write defaults");

        assert_eq!(read_timezone(&dir).expect("timezone"), chrono_tz::America::Sao_Paulo);
        assert_eq!(read_ai_model(&dir).expect("model"), DEFAULT_AI_MODEL);

        // A second call must not clobber user edits.
        let path = dir.join(APP_JSON);
        fs::write(
            &path,
            "{\"schema\":1,\"timezone\":\"Europe/Lisbon\",\"aiModel\":\"gemini-2.0-pro\"}\n",
        )
        .expect("edit config");
        ensure_default_configs(&dir).expect("re-run defaults");
        assert_eq!(read_timezone(&dir).expect("timezone"), chrono_tz::Europe::Lisbon);
        assert_eq!(read_ai_model(&dir).expect("model"), "gemini-2.0-pro");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_config_rejects_unknown_schema() {
        let dir = temp_config_dir("schema");
        fs::write(dir.join(APP_JSON), "{\"schema\":2}\n").expect("write config");
        assert!(matches!(
            read_timezone(&dir),
            Err(InfraError::InvalidConfig(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_timezone_rejects_unknown_zone_name() {
        let dir = temp_config_dir("zone");
        fs::write(dir.join(APP_JSON), "{\"schema\":1,\"timezone\":\"Mars/Olympus\"}\n")
            .expect("write config");
        assert!(matches!(
            read_timezone(&dir),
            Err(InfraError::InvalidConfig(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = temp_config_dir("fallback");
        fs::write(dir.join(APP_JSON), "{\"schema\":1}\n").expect("write config");
        assert_eq!(read_timezone(&dir).expect("timezone"), chrono_tz::America::Sao_Paulo);
        assert_eq!(read_ai_model(&dir).expect("model"), DEFAULT_AI_MODEL);
        let _ = fs::remove_dir_all(&dir);
    }
}
