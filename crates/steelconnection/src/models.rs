// Typed records returned by the helper workflows, plus the appliance model
// name table.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

/// Readiness record from `node/{id}/image_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStatus {
    pub status: String,
    /// Server-side file name to request from `get_image`.
    pub image_file: String,
    #[serde(default)]
    pub image_type: Option<String>,
}

/// A completed image download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDownload {
    pub path: PathBuf,
    pub bytes: u64,
}

impl ImageDownload {
    /// Human readable size, e.g. `1.2 MB`.
    pub fn filesize(&self) -> String {
        ByteSize::b(self.bytes).to_string()
    }
}

/// Hardware code names and their marketing names.
const MODELS: &[(&str, &str)] = &[
    ("aardvark", "SDI-S12"),
    ("baloo", "SDI-SH"),
    ("beorn", "SDI-ZAKSH"),
    ("booboo", "SDI-AWS"),
    ("cx3070", "3070-SD"),
    ("cx570", "570-SD"),
    ("cx770", "770-SD"),
    ("ewok", "SDI-330"),
    ("fozzy", "SDI-USB"),
    ("grizzly", "SDI-1030"),
    ("koala", "SDI-AP5"),
    ("kodiak", "SDI-S48"),
    ("misha", "SDI-AZURE-SH"),
    ("paddington", "SDI-AZURE"),
    ("panda", "SDI-130"),
    ("panther", "SDI-5030"),
    ("raccoon", "SDI-AP3"),
    ("sloth", "SDI-S24"),
    ("tiger1g", "SDI-2030"),
    ("ursus", "SDI-AP5r"),
    ("xirrusap", "Xirrus AP"),
    ("yogi", "SDI-VGW"),
];

static MODEL_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    MODELS
        .iter()
        .flat_map(|&(code, name)| [(code, name), (name, code)])
        .collect()
});

/// Translate a code name to its marketing name or back. Case-sensitive.
pub fn translate_model(value: &str) -> Option<&'static str> {
    MODEL_NAMES.get(value).copied()
}

/// All `(code name, marketing name)` pairs.
pub fn model_table() -> &'static [(&'static str, &'static str)] {
    MODELS
}
