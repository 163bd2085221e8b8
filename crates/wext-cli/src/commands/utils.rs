use std::path::Path;

use wext_bundler::BuildOutput;

use crate::ui::SummaryEntry;

/// Sizes of every emitted file, in output order. Files that have gone
/// missing since the build are reported with size zero.
pub async fn collect_summary(out_dir: &Path, output: &BuildOutput) -> Vec<SummaryEntry> {
    let mut entries = Vec::new();
    for file_name in output.file_names() {
        let size = tokio::fs::metadata(out_dir.join(file_name))
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);
        entries.push(SummaryEntry {
            file_name: file_name.to_string(),
            size,
        });
    }
    entries
}

/// `path` relative to `root` when possible, for display.
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
