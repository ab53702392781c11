//! Source line lookup for JSON pointers.
//!
//! `serde_json` drops positions, so the template text is scanned once more to record the line on
//! which every value starts. The text has already been parsed successfully when this runs, so the
//! scanner stops quietly on anything unexpected instead of reporting errors.

use armguard_domain::json::pointer_push;
use armguard_types::ControlResult;
use std::collections::BTreeMap;

/// 1-based start line of every value in a JSON document, keyed by JSON pointer.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    lines: BTreeMap<String, u32>,
}

impl LineIndex {
    pub fn build(source: &str) -> Self {
        let mut scanner = Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            lines: BTreeMap::new(),
        };
        scanner.value(String::new());
        Self {
            lines: scanner.lines,
        }
    }

    pub fn line_of(&self, pointer: &str) -> Option<u32> {
        self.lines.get(pointer).copied()
    }

    /// Fill in line numbers for every marker whose pointer is present in the document.
    pub fn annotate(&self, result: &mut ControlResult) {
        result.resource_data_marker.line = self.line_of(&result.resource_data_marker.pointer);
        for marker in &mut result.result_data_markers {
            marker.line = self.line_of(&marker.pointer);
        }
    }
}

struct Scanner<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    line: u32,
    lines: BTreeMap<String, u32>,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b'\n' => self.line += 1,
                b' ' | b'\r' | b'\t' => {}
                _ => return,
            }
            self.pos += 1;
        }
    }

    fn value(&mut self, pointer: String) {
        self.skip_ws();
        // Duplicate keys: the last one wins, as in serde_json.
        self.lines.insert(pointer.clone(), self.line);
        match self.peek() {
            Some(b'{') => self.object(&pointer),
            Some(b'[') => self.array(&pointer),
            Some(b'"') => {
                let _ = self.string();
            }
            Some(_) => self.scalar(),
            None => {}
        }
    }

    fn object(&mut self, pointer: &str) {
        self.pos += 1;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return;
                }
                Some(b',') => self.pos += 1,
                Some(b'"') => {
                    let Some(key) = self.string() else { return };
                    self.skip_ws();
                    if self.peek() != Some(b':') {
                        return;
                    }
                    self.pos += 1;
                    self.value(pointer_push(pointer, &key));
                }
                _ => return,
            }
        }
    }

    fn array(&mut self, pointer: &str) {
        self.pos += 1;
        let mut index = 0usize;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return;
                }
                Some(b',') => self.pos += 1,
                None => return,
                Some(_) => {
                    let before = self.pos;
                    self.value(format!("{pointer}/{index}"));
                    index += 1;
                    if self.pos == before {
                        return;
                    }
                }
            }
        }
    }

    /// Consume a string literal starting at the opening quote and return its decoded text.
    fn string(&mut self) -> Option<String> {
        let start = self.pos;
        self.pos += 1;
        let mut escaped = false;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => {
                    self.pos += 1;
                    escaped = true;
                }
                b'"' => {
                    let raw = self.source.get(start..self.pos)?;
                    return if escaped {
                        serde_json::from_str(raw).ok()
                    } else {
                        Some(raw[1..raw.len() - 1].to_string())
                    };
                }
                _ => {}
            }
        }
        None
    }

    fn scalar(&mut self) {
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b']' | b'}' | b' ' | b'\n' | b'\r' | b'\t') {
                return;
            }
            self.pos += 1;
        }
    }
}
