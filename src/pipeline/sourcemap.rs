// src/pipeline/sourcemap.rs

//! Line-granular Source Map v3 generation.

use serde::Serialize;

use crate::pipeline::SourceFile;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub source_root: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Map every output line of `file` that has an origin to column 0 of
    /// that origin.
    pub fn for_file(file: &SourceFile, file_name: &str) -> Self {
        let sources: Vec<String> = file.sources.iter().map(|s| s.name.to_string()).collect();
        let sources_content = file.sources.iter().map(|s| s.content.to_string()).collect();

        let mut mappings = String::new();
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;

        for (idx, line) in file.lines.iter().enumerate() {
            if idx > 0 {
                mappings.push(';');
            }
            let Some(origin) = &line.origin else {
                continue;
            };
            let Some(source_idx) = sources.iter().position(|s| **s == *origin.source) else {
                continue;
            };
            let source_idx = source_idx as i64;
            let orig_line = i64::from(origin.line);

            // [generated column, source, original line, original column]
            encode_vlq(&mut mappings, 0);
            encode_vlq(&mut mappings, source_idx - prev_source);
            encode_vlq(&mut mappings, orig_line - prev_line);
            encode_vlq(&mut mappings, 0);

            prev_source = source_idx;
            prev_line = orig_line;
        }

        Self {
            version: 3,
            file: file_name.to_string(),
            source_root: "/source/".to_string(),
            sources,
            sources_content,
            names: Vec::new(),
            mappings,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Append the base64 VLQ encoding of `value`.
pub fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq: u64 = if value < 0 {
        ((value.unsigned_abs()) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Comment pointing a CSS or JS file at its map.
pub fn mapping_url_comment(file_name: &str, map_name: &str) -> String {
    if file_name.ends_with(".css") {
        format!("/*# sourceMappingURL={map_name} */")
    } else {
        format!("//# sourceMappingURL={map_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Concat;

    fn vlq(v: i64) -> String {
        let mut s = String::new();
        encode_vlq(&mut s, v);
        s
    }

    #[test]
    fn vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
    }

    #[test]
    fn maps_concatenated_lines_back_to_sources() {
        let file = Concat::new("out.js")
            .join(vec![
                SourceFile::from_text("a.js", "a()\nb()"),
                SourceFile::from_text("b.js", "c()"),
            ])
            .unwrap();
        let map = SourceMap::for_file(&file, "out.js");
        assert_eq!(map.sources, vec!["a.js", "b.js"]);
        // a.js:0, a.js:1, b.js:0
        assert_eq!(map.mappings, "AAAA;AACA;ACDA");

        let json = map.to_json().unwrap();
        assert!(json.contains("\"sourcesContent\""));
        assert!(json.contains("\"sourceRoot\":\"/source/\""));
    }

    #[test]
    fn comment_style_follows_extension() {
        assert_eq!(
            mapping_url_comment("x.min.css", "x.min.css.map"),
            "/*# sourceMappingURL=x.min.css.map */"
        );
        assert_eq!(
            mapping_url_comment("x.min.js", "x.min.js.map"),
            "//# sourceMappingURL=x.min.js.map"
        );
    }
}
