use quick_xml::{events::Event, Reader};

use super::*;

lazy_static! {
  static ref XMLNS_ATTR: Regex = Regex::new(r#"\s+xmlns(?::\w+)?="[^"]*""#).unwrap();
  static ref ELEMENT_PREFIX: Regex = Regex::new(r"(</?)[A-Za-z_][\w.-]*:").unwrap();
}

/// Configuration for XML response processing
#[derive(Debug, Clone, Deserialize)]
pub struct XmlConfig {
  /// Whether to strip namespaces from response
  #[serde(default)]
  pub strip_namespaces: bool,
  /// Element path of one result entry, e.g. `feed/entry` for Atom feeds
  pub entry_path:       String,
}

impl ResponseProcessor for XmlConfig {
  fn process_response(
    &self,
    data: &[u8],
    field_maps: &BTreeMap<String, FieldMap>,
  ) -> Result<Vec<Candidate>> {
    let xml = if self.strip_namespaces {
      strip_xml_namespaces(&String::from_utf8_lossy(data))
    } else {
      String::from_utf8_lossy(data).into_owned()
    };

    let entries = self.extract_entries(&xml)?;
    Ok(
      entries
        .iter()
        .filter_map(|content| build_candidate(field_maps, |path| content.get(path).cloned()))
        .collect(),
    )
  }
}

impl XmlConfig {
  /// Collects the text content of every entry element, keyed by path relative to the entry.
  ///
  /// Repeated elements inside one entry (several authors, say) are joined with a space.
  fn extract_entries(&self, xml: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let entry_path: Vec<&str> = self.entry_path.split('/').filter(|p| !p.is_empty()).collect();
    let mut reader = Reader::from_str(xml);
    let mut path_stack: Vec<String> = Vec::new();
    let mut current: Option<BTreeMap<String, String>> = None;
    let mut entries = Vec::new();

    loop {
      let text = match reader.read_event() {
        Ok(Event::Start(e)) => {
          path_stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
          if current.is_none() && is_path(&path_stack, &entry_path) {
            current = Some(BTreeMap::new());
          }
          continue;
        },
        Ok(Event::End(_)) => {
          if is_path(&path_stack, &entry_path) {
            if let Some(content) = current.take() {
              entries.push(content);
            }
          }
          path_stack.pop();
          continue;
        },
        Ok(Event::Text(e)) => match e.unescape() {
          Ok(text) => text.into_owned(),
          Err(e) => {
            warn!("Skipping undecodable XML text: {e}");
            continue;
          },
        },
        Ok(Event::CData(e)) => String::from_utf8_lossy(&e.into_inner()).into_owned(),
        Ok(Event::Eof) => break,
        Err(e) => {
          return Err(PaperfetchError::Resolution(format!(
            "Malformed XML at position {}: {e}",
            reader.buffer_position()
          )))
        },
        _ => continue,
      };

      let text = text.trim();
      if text.is_empty() {
        continue;
      }
      if let Some(content) = current.as_mut() {
        let key = path_stack[entry_path.len().min(path_stack.len())..].join("/");
        content
          .entry(key)
          .and_modify(|existing| {
            existing.push(' ');
            existing.push_str(text);
          })
          .or_insert_with(|| text.to_string());
      }
    }

    Ok(entries)
  }
}

fn is_path(stack: &[String], path: &[&str]) -> bool {
  stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

/// Removes namespace declarations and element prefixes so paths can be written without them.
fn strip_xml_namespaces(xml: &str) -> String {
  let without_decls = XMLNS_ATTR.replace_all(xml, "");
  ELEMENT_PREFIX.replace_all(&without_decls, "$1").into_owned()
}
