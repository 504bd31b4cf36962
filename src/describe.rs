use crate::boxes::BoxId;
use crate::file::Mp4File;
use crate::registry::Registry;
use std::fmt::Write;

/// Layout of [`print_tree`] output.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Total line width descriptions are fitted into.
    pub width: usize,
}

impl Default for PrintOptions {
    /// Width from `COLUMNS`, else 80.
    fn default() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(80);
        PrintOptions { width }
    }
}

/// One `[code] size description` line per box, indented two spaces per
/// level below `from`. The synthetic root is not printed.
pub fn print_tree(file: &Mp4File, from: BoxId, registry: &Registry, opts: &PrintOptions) -> String {
    print_with(file, from, opts, |f, id, width| registry.describe(f, id, width))
}

/// Like [`print_tree`], with a caller-supplied describer. The describer gets
/// the width left for the description on that line.
pub fn print_with<F>(file: &Mp4File, from: BoxId, opts: &PrintOptions, mut describe: F) -> String
where
    F: FnMut(&Mp4File, BoxId, usize) -> String,
{
    // The root is skipped, so its children take the unindented level.
    let base = usize::from(from != file.root());
    let mut out = String::new();
    file.walk(from, |f, id, depth| {
        let b = f.get(id);
        if id == f.root() {
            return;
        }
        let depth = depth + base;
        let width = opts.width.saturating_sub(depth * 2 + 16);
        let desc = describe(f, id, width);
        let _ = writeln!(
            out,
            "{}[{}] {:08x} {}",
            "  ".repeat(depth - 1),
            b.typ,
            b.size,
            desc
        );
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_width_is_positive() {
        assert!(PrintOptions::default().width > 0);
    }
}
