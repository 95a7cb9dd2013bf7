//! Profiler export readers.
//!
//! Both call-tree formats are flattened into `RawFrame`s in document order:
//! CSV exports encode depth as leading spaces in the first column, XML
//! exports as element nesting.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::config::ProfilerSection;
use crate::domain::resolver::decode_descriptor_params;

/// A call-tree row before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub depth: usize,
    pub label: String,
}

/// `name(...)` shape. Anything else (packages, "Self time" rows, totals) is
/// not a call.
pub fn is_method_shaped(label: &str) -> bool {
    label.contains('(') && label.ends_with(')')
}

/// Keep only labels under `prefix`. An empty prefix keeps everything.
pub fn in_scope(label: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('.');
    prefix.is_empty() || label.starts_with(&format!("{prefix}."))
}

/// Read an indented call-tree CSV. The first row is a header.
pub fn read_csv_frames(text: &str, settings: &ProfilerSection) -> Vec<RawFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(text.as_bytes());

    let width = settings.indent_width.max(1);
    let mut frames = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping CSV row {}: {e}", idx + 2);
                continue;
            }
        };
        let Some(name) = record.get(0) else {
            continue;
        };
        let label = name.trim();
        if label.is_empty() || label.starts_with(settings.self_time_label.as_str()) || !is_method_shaped(label) {
            continue;
        }
        let leading = name.len() - name.trim_start_matches(' ').len();
        frames.push(RawFrame {
            depth: leading / width,
            label: label.to_string(),
        });
    }
    frames
}

/// Read a nested call-tree XML. Frames are elements with `class` and
/// `methodName` attributes; `methodSignature` (a JVM descriptor) supplies
/// the parameter types when present.
pub fn read_xml_frames(text: &str) -> Result<Vec<RawFrame>, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut frames = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if let Some(label) = frame_label(e)? {
                    frames.push(RawFrame { depth, label });
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(label) = frame_label(e)? {
                    frames.push(RawFrame { depth, label });
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error at {}: {e}", reader.buffer_position())),
            _ => {}
        }
    }
    Ok(frames)
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, String> {
    match e.try_get_attribute(name).map_err(|e| e.to_string())? {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            Ok(Some(value.trim().to_string()))
        }
        None => Ok(None),
    }
}

fn frame_label(e: &BytesStart<'_>) -> Result<Option<String>, String> {
    let (Some(class), Some(method)) = (attribute(e, "class")?, attribute(e, "methodName")?) else {
        return Ok(None);
    };
    if class.is_empty() || method.is_empty() {
        return Ok(None);
    }
    let params = attribute(e, "methodSignature")?
        .and_then(|descriptor| decode_descriptor_params(&descriptor))
        .unwrap_or_default();
    Ok(Some(format!("{class}.{method}({})", params.join(", "))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_depth_from_indentation() {
        let csv = "Name,Total Time\n\
                   \"org.acme.A.run ()\",10\n\
                   \"  org.acme.B.go (String)\",5\n\
                   \"    Self time\",1\n\
                   \"    org.acme\",1\n\
                   \"    org.acme.C.leaf (int, long)\",2\n";
        let frames = read_csv_frames(csv, &ProfilerSection::default());
        assert_eq!(
            frames,
            vec![
                RawFrame { depth: 0, label: "org.acme.A.run ()".to_string() },
                RawFrame { depth: 1, label: "org.acme.B.go (String)".to_string() },
                RawFrame { depth: 2, label: "org.acme.C.leaf (int, long)".to_string() },
            ]
        );
    }

    #[test]
    fn test_xml_depth_from_nesting() {
        let xml = r#"<tree>
  <node class="org.acme.A" methodName="run" methodSignature="()V">
    <node class="org.acme.B" methodName="go" methodSignature="(Ljava/lang/String;I)V">
      <node class="org.acme.C" methodName="leaf"/>
    </node>
  </node>
</tree>"#;
        let frames = read_xml_frames(xml).unwrap();
        let summary: Vec<(usize, &str)> = frames.iter().map(|f| (f.depth, f.label.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (1, "org.acme.A.run()"),
                (2, "org.acme.B.go(java.lang.String, int)"),
                (3, "org.acme.C.leaf()"),
            ]
        );
    }

    #[test]
    fn test_scope_prefix() {
        assert!(in_scope("org.acme.A.run()", "org.acme"));
        assert!(in_scope("org.acme.A.run()", "org.acme."));
        assert!(!in_scope("org.acmex.A.run()", "org.acme"));
        assert!(in_scope("java.lang.Thread.run()", ""));
    }
}
