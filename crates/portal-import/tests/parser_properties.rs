//! Property tests for the outline parser

use portal_import::MarkdownProjectParser;
use proptest::prelude::*;

/// Plain words, never starting with a markdown marker
fn word() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,8}"
}

fn title() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..4).prop_map(|w| w.join(" "))
}

#[derive(Debug, Clone)]
struct Outline {
    name: String,
    screens: Vec<(String, Vec<String>)>,
    orphans: Vec<String>,
}

impl Outline {
    fn render(&self) -> String {
        let mut out = format!("# {}\n", self.name);
        for orphan in &self.orphans {
            out.push_str(&format!("- [ ] {orphan}\n"));
        }
        for (screen, tasks) in &self.screens {
            out.push_str(&format!("\n## {screen}\n"));
            for (i, task) in tasks.iter().enumerate() {
                let mark = if i % 2 == 0 { " " } else { "x" };
                out.push_str(&format!("- [{mark}] {task}\n"));
            }
        }
        out
    }
}

fn outline() -> impl Strategy<Value = Outline> {
    (
        title(),
        prop::collection::vec((title(), prop::collection::vec(title(), 0..6)), 0..6),
        prop::collection::vec(title(), 0..3),
    )
        .prop_map(|(name, screens, orphans)| Outline { name, screens, orphans })
}

proptest! {
    #[test]
    fn parsing_is_deterministic(text in outline().prop_map(|o| o.render())) {
        let parser = MarkdownProjectParser::new();
        prop_assert_eq!(parser.parse(&text).unwrap(), parser.parse(&text).unwrap());
    }

    #[test]
    fn tree_mirrors_outline(o in outline()) {
        let project = MarkdownProjectParser::new().parse(&o.render()).unwrap();

        prop_assert_eq!(&project.name, &o.name);
        let screens: Vec<_> = project.screens.iter().map(|s| s.title.clone()).collect();
        let expected: Vec<_> = o.screens.iter().map(|(s, _)| s.clone()).collect();
        prop_assert_eq!(screens, expected);
        for (parsed, (_, tasks)) in project.screens.iter().zip(&o.screens) {
            let titles: Vec<_> = parsed.tasks.iter().map(|t| t.title.clone()).collect();
            prop_assert_eq!(&titles, tasks);
            prop_assert!(parsed.tasks.iter().all(|t| t.description.is_none()));
        }
        let total: usize = o.screens.iter().map(|(_, t)| t.len()).sum();
        prop_assert_eq!(project.task_count(), total);
    }

    #[test]
    fn no_heading_never_yields_a_project(lines in prop::collection::vec(title(), 0..10)) {
        let text = lines.join("\n");
        prop_assert!(MarkdownProjectParser::new().parse(&text).is_err());
    }
}
