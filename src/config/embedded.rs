//! Embedded default configuration and data

use rust_embed::Embed;

/// Default rulebooks and extracted data compiled into the binary.
///
/// Used when the config-and-data directory does not provide a file, so the
/// engine can boot (and tests can run) without any external files.
#[derive(Embed)]
#[folder = "defaults/"]
struct EmbeddedDefaults;

/// Read an embedded default file as UTF-8
pub fn read_default(name: &str) -> Option<String> {
    let file = EmbeddedDefaults::get(name)?;
    String::from_utf8(file.data.into_owned()).ok()
}
