use serde_json::Value;

use super::*;

/// Configuration for JSON response processing
#[derive(Debug, Clone, Deserialize)]
pub struct JsonConfig {
  /// `/`-separated path to the array of result entries, empty when the body is the array itself
  #[serde(default)]
  pub entries_path: String,
}

impl ResponseProcessor for JsonConfig {
  fn process_response(
    &self,
    data: &[u8],
    field_maps: &BTreeMap<String, FieldMap>,
  ) -> Result<Vec<Candidate>> {
    let json: Value = serde_json::from_slice(data)
      .map_err(|e| PaperfetchError::Resolution(format!("Failed to parse JSON: {e}")))?;

    let entries = get_path_value(&json, &self.entries_path)
      .and_then(Value::as_array)
      .ok_or_else(|| {
        PaperfetchError::Resolution(format!("No result list at `{}`", self.entries_path))
      })?;

    Ok(
      entries
        .iter()
        .filter_map(|entry| build_candidate(field_maps, |path| get_by_path(entry, path)))
        .collect(),
    )
  }
}

/// Walks a `/`-separated path, treating numeric parts as array indices.
fn get_path_value<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
  let mut current = json;
  for part in path.split('/').filter(|p| !p.is_empty()) {
    current = match part.parse::<usize>() {
      Ok(index) if current.is_array() => current.as_array()?.get(index)?,
      _ => current.get(part)?,
    };
  }
  Some(current)
}

fn get_by_path(json: &Value, path: &str) -> Option<String> {
  match get_path_value(json, path)? {
    Value::String(s) => Some(s.clone()),
    Value::Array(arr) => arr.first().and_then(|first| match first {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CROSSREF_RESPONSE: &str = r#"{
    "status": "ok",
    "message": {
      "items": [
        {
          "DOI": "10.1234/deepbeats",
          "title": ["Deep   Beats"],
          "issued": { "date-parts": [[2021, 5, 3]] },
          "link": [{ "URL": "https://example.org/deepbeats.pdf", "content-type": "application/pdf" }]
        },
        {
          "DOI": "10.1234/nolink",
          "title": ["A Paper Without a Link"]
        },
        {
          "title": ["Missing Identifier"]
        }
      ]
    }
  }"#;

  #[test]
  fn test_crossref_response_to_candidates() {
    let config = RetrieverConfig::crossref().unwrap();
    let candidates = config
      .processor()
      .process_response(CROSSREF_RESPONSE.as_bytes(), &config.field_maps)
      .unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(
      candidates[0],
      Candidate::new("Deep Beats", "10.1234/deepbeats")
        .with_pdf_url("https://example.org/deepbeats.pdf")
        .with_year(2021)
    );
    assert_eq!(candidates[1], Candidate::new("A Paper Without a Link", "10.1234/nolink"));
  }

  #[test]
  fn test_root_array_entries() {
    let config = JsonConfig { entries_path: String::new() };
    let mut field_maps = BTreeMap::new();
    field_maps.insert("title".to_string(), FieldMap { path: "name".into(), transform: None });
    field_maps.insert("identifier".to_string(), FieldMap { path: "id".into(), transform: None });
    field_maps.insert("pdf_url".to_string(), FieldMap {
      path:      "id".into(),
      transform: Some(Transform::Url {
        base:   "https://example.org/{value}".into(),
        suffix: Some(".pdf".into()),
      }),
    });

    let candidates =
      config.process_response(br#"[{"name": "Deep Beats", "id": 7}]"#, &field_maps).unwrap();
    assert_eq!(candidates[0].identifier, "7");
    assert_eq!(candidates[0].pdf_url.as_deref(), Some("https://example.org/7.pdf"));
  }

  #[test]
  fn test_missing_result_list_is_resolution_error() {
    let config = RetrieverConfig::crossref().unwrap();
    let result = config.processor().process_response(br#"{"status": "ok"}"#, &config.field_maps);
    assert!(matches!(result, Err(PaperfetchError::Resolution(_))));

    let result = config.processor().process_response(b"not json", &config.field_maps);
    assert!(matches!(result, Err(PaperfetchError::Resolution(_))));
  }
}
