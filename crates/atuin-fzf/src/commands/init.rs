use std::path::Path;

use super::{self_exe, shell_quote};

pub fn run(shell: &str) -> eyre::Result<()> {
    let integration = match shell {
        "zsh" => generate_zsh_integration(&self_exe()),
        _ => eyre::bail!("Unsupported shell: {}", shell),
    };

    println!("{}", integration);
    Ok(())
}

/// Generate the zsh widget bound to Ctrl-R - pure function for easy testing
pub fn generate_zsh_integration(exe: &Path) -> String {
    let exe = shell_quote(exe);

    let widget = r#"
# Re-run prompt hooks so a changed directory shows up in the prompt
_atuin_fzf_redraw_prompt() {
    local precmd
    for precmd in $precmd_functions; do
        $precmd
    done
    zle reset-prompt
}

_atuin_fzf_history() {
    local result
    result=$(__EXE__ search -- "$BUFFER")
    if [[ -z "$result" ]]; then
        zle redisplay
        return
    fi

    if [[ "$result" == "CHDIR:"* ]]; then
        local marker dir cmd
        IFS=$'\t' read -r marker dir cmd <<< "$result"
        cd -- "$dir"
        BUFFER="$cmd"
        CURSOR=${#BUFFER}
        _atuin_fzf_redraw_prompt
    else
        BUFFER="$result"
        CURSOR=${#BUFFER}
        zle redisplay
    fi
}

zle -N _atuin_fzf_history
bindkey '^r' _atuin_fzf_history
"#;

    widget.trim().replace("__EXE__", &exe)
}
