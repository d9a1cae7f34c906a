//! Test doubles shared by the unit tests

use crate::http::{HttpFetch, HttpResponse};
use crate::{Result, YrError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};

/// Records every requested URL and answers from a fixed table.
/// Unknown URLs fail with a network error.
#[derive(Default)]
pub struct FakeHttp {
    responses: HashMap<String, HttpResponse>,
    calls: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl HttpFetch for FakeHttp {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| YrError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

/// Build an in-memory zip archive from `(file name, contents)` pairs
pub fn zip_archive(tables: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in tables {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
