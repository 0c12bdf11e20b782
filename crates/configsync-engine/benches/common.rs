// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_keyword_list(groups: usize) -> String {
    let mut content = String::from("# Version: 1.0.0\n\n[GLOBAL_FILTER]\nadvertisement\ngiveaway\n\n[WORD_GROUPS]\n\n");

    for group in 0..groups {
        match group % 4 {
            0 => {
                content.push_str(&format!("[Topic {group}]\nalpha{group}\n+beta{group}\n!gamma\n@5\n"));
            }
            1 => {
                content.push_str(&format!("# plain group {group}\nword{group}\n/\\bre{group}\\b/\n"));
            }
            2 => {
                content.push_str(&format!("brand{group} => Brand{group}\nsub{group} => Sub{group}\n"));
            }
            _ => {
                content.push_str(&format!("single{group} => Single{group}\n"));
            }
        }
        content.push('\n');
    }

    content
}

#[allow(dead_code)]
pub fn generate_yaml_config(modules: usize, items: usize) -> String {
    let mut content = String::from("# Version: 1.0.0\n\n");

    for module in 0..modules {
        content.push_str(&format!("module{module}:\n  enabled: true  # switch\n  label: \"m{module}\"\n  items:\n"));
        for item in 0..items {
            content.push_str(&format!(
                "    - id: \"i{item}\"\n      url: \"https://example.com/{module}/{item}\"\n"
            ));
        }
        content.push_str("  # trailing note\n  limit: 10\n\n");
    }

    content
}
