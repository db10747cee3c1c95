use clap::CommandFactory;
use clap_complete::aot::{generate, Shell};

fn completions(shell: Shell) -> String {
    let mut buf = Vec::new();
    generate(shell, &mut groucho::cli::Cli::command(), "groucho", &mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn completions_cover_every_shell() {
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        let output = completions(shell);
        assert!(!output.is_empty(), "{shell} completions should not be empty");
        assert!(
            output.contains("groucho"),
            "{shell} completions should reference 'groucho'"
        );
    }
}

#[test]
fn completions_include_nested_profile_commands() {
    let output = completions(Shell::Bash);
    assert!(output.contains("restore"));
    assert!(output.contains("backup"));
}
