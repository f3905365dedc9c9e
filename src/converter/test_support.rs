//! Shell scripts that stand in for LibreOffice.
//!
//! Shared by the unit tests and, through `tests/common.rs`, the integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes `<outdir>/<stem>.pdf` containing a PDF header followed by the input bytes.
pub const WORKING_CONVERTER: &str = r#"#!/bin/sh
outdir=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outdir) outdir="$2"; shift 2 ;;
    --convert-to) shift 2 ;;
    *) input="$1"; shift ;;
  esac
done
name=$(basename "$input")
stem="${name%.*}"
printf '%%PDF-1.4\n' > "$outdir/$stem.pdf"
cat "$input" >> "$outdir/$stem.pdf"
"#;

pub const FAILING_CONVERTER: &str = r#"#!/bin/sh
echo "Error: source file could not be loaded" >&2
exit 3
"#;

/// Exits 0 without producing anything.
pub const SILENT_CONVERTER: &str = "#!/bin/sh\nexit 0\n";

/// Writes an empty file where the PDF should be.
pub const EMPTY_OUTPUT_CONVERTER: &str = r#"#!/bin/sh
outdir=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outdir) outdir="$2"; shift 2 ;;
    --convert-to) shift 2 ;;
    *) input="$1"; shift ;;
  esac
done
name=$(basename "$input")
: > "$outdir/${name%.*}.pdf"
"#;

pub const HANGING_CONVERTER: &str = "#!/bin/sh\nexec sleep 30\n";

/// Behaves like the `libreoffice` launcher: starts a helper that outlives it
/// unless the whole process group is killed. The helper touches `survived`
/// next to the script after two seconds.
pub const FORKING_HANGING_CONVERTER: &str = r#"#!/bin/sh
sh -c 'sleep 2; touch "$0"' "$(dirname "$0")/survived" &
wait
"#;

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
