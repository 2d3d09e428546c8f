use std::{cell::RefCell, io::{self, BufRead, Write}, path::{Path, PathBuf}, rc::Rc};

use anyhow::bail;
use itertools::Itertools;
use serde::Deserialize;


/// Output sink that can be handed to an evaluation context while the test
/// keeps a handle to read back what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One expected outcome: `{"ok": true, "output": "<printed value>"}` or
/// `{"ok": false, "type": "<ErrorKind>"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    ok: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl Expectation {
    pub fn to_result(&self) -> anyhow::Result<Result<String, String>> {
        match (self.ok, &self.output, &self.kind) {
            (true, Some(output), None) => Ok(Ok(output.clone())),
            (false, None, Some(kind)) => Ok(Err(kind.clone())),
            _ => bail!("Malformed expectation {:?}", self),
        }
    }
}

fn load_input_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let source = std::fs::read(path)?;
    Ok(source.lines().collect::<Result<Vec<String>, _>>()?)
}

fn load_output_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Expectation>> {
    let source = std::fs::read(path)?;
    let result: Vec<Expectation> = serde_json::from_slice(&source)?;
    Ok(result)
}

pub fn load_test_pair(testcase: &str) -> anyhow::Result<Vec<(String, Expectation)>> {
    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input = load_input_file(base_path.join("test_inputs").join(format!("{}.lisp", testcase)))?;
    let output = load_output_file(base_path.join("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() {
        bail!("Testcase {}: {} inputs but {} expectations", testcase, input.len(), output.len());
    }
    Ok(input.into_iter().zip(output).collect_vec())
}

pub fn all_testcases() -> impl Iterator<Item = &'static str> {
    ["arithmetic", "lists", "strings", "forms", "functions", "scoping"].into_iter()
}
