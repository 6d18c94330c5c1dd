//! Header prepended to post-processed files.

use std::path::Path;

/// Header lines naming the tool and the original file, followed by two
/// blank lines.
pub fn render_header(tool: &str, input: &Path) -> String {
    format!(
        "; This file has been post-processed by {tool}\n\
         ; Original File Location: {}\n\
         \n\
         \n",
        input.display()
    )
}
