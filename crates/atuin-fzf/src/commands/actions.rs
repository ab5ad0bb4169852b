use std::path::Path;

use atuin_fzf_history::FilterMode;

use super::shell_quote;

/// The fzf action that switches to the directory filter after the one named
/// in `prompt`.
///
/// fzf passes its current prompt (e.g. `"subtree> "`), so the prompt doubles
/// as the record of which filter is active.
pub fn next_filter_action(exe: &Path, prompt: &str) -> String {
    let current = prompt.trim_end().trim_end_matches('>').trim_end();
    let next = FilterMode::next_from_name(current);

    let exe = shell_quote(exe);

    format!("reload({exe} list --dir-filter={next} -- {{q}})+change-prompt({next}> )")
}
