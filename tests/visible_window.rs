//! Visible window tests: `¿...?` windows and the hidden trailing `?`

mod common;

use common::{formula, part_id, variables};
use xfl_editor::model::{Formula, FormulaOptions, NewPart, Operator, Part, SpecialToken};

fn visible_texts(f: &Formula) -> Vec<String> {
    f.visible_parts().map(|p| p.text().to_string()).collect()
}

// ========================================================================
// Explicit Window
// ========================================================================

#[test]
fn test_window_between_sentinels() {
    let f = formula("%0%¿%1%?%2%");
    assert_eq!(visible_texts(&f), vec!["%1%"]);
    assert_eq!(f.visible_expression(), "%1%");

    let before = f.part_before_visible_part().map(Part::text);
    let after = f.part_after_visible_part().map(Part::text);
    assert_eq!(before, Some("¿"));
    assert_eq!(after, Some("?"));
}

#[test]
fn test_window_uses_last_opening_sentinel() {
    let f = formula("¿%0%¿%1%.id?");
    assert_eq!(visible_texts(&f), vec!["%1%", ".id"]);
    assert_eq!(f.part_before_visible_part().unwrap().id, f.parts()[2].id);
}

#[test]
fn test_empty_window() {
    let f = formula("%0%¿?");
    assert!(f.visible_parts().next().is_none());
    assert!(f.part_before_visible_part().is_some());
}

#[test]
fn test_opening_sentinel_without_end_shows_everything() {
    let f = formula("%0%¿%1%");
    assert_eq!(visible_texts(&f), vec!["%0%", "¿", "%1%"]);
    assert!(f.part_before_visible_part().is_none());
    assert!(f.part_after_visible_part().is_none());
}

#[test]
fn test_insert_respects_window() {
    let mut f = formula("%0%¿%1%?%2%");
    f.insert_keystroke('+', None, true);
    assert_eq!(f.expression(), "%0%¿%1%+?%2%");
    assert_eq!(visible_texts(&f), vec!["%1%", "+"]);

    f.insert_keystroke('+', None, false);
    assert_eq!(f.expression(), "%0%¿%1%+?%2%+");
}

#[test]
fn test_insert_into_empty_window() {
    let mut f = formula("%0%¿?%2%");
    f.add_part(NewPart::operation(Operator::Not), None, true);
    assert_eq!(f.expression(), "%0%¿!?%2%");
    assert_eq!(visible_texts(&f), vec!["!"]);
}

#[test]
fn test_removing_sentinel_widens_window() {
    let mut f = formula("%0%¿%1%?%2%");
    let end = part_id(&f, "?");
    f.remove_part(end);
    assert_eq!(visible_texts(&f).len(), 4);
}

// ========================================================================
// Hidden Question Mark
// ========================================================================

#[test]
fn test_single_question_mark_is_hidden() {
    let f = formula("%0%.id?");
    assert_eq!(visible_texts(&f), vec!["%0%", ".id"]);
    assert_eq!(f.expression(), "%0%.id?");
    assert!(f.part_after_visible_part().is_none());
}

#[test]
fn test_question_mark_shown_when_not_hidden() {
    let options = FormulaOptions {
        hide_question_mark: false,
        ..FormulaOptions::default()
    };
    let mut f = Formula::new(variables(), vec![]).with_options(options);
    f.parse_expression("%0%?");
    assert_eq!(visible_texts(&f), vec!["%0%", "?"]);
}

#[test]
fn test_insert_lands_before_hidden_question_mark() {
    let mut f = formula("%0%?");
    f.add_part(NewPart::member("id", false), None, true);
    assert_eq!(f.expression(), "%0%.id?");
}

#[test]
fn test_parse_keeps_only_first_question_mark() {
    let f = formula("%0%?%1%?");
    assert_eq!(f.expression(), "%0%?%1%");
    let count = f
        .parts()
        .iter()
        .filter(|p| p.is_special_token(SpecialToken::VisibleEnd))
        .count();
    assert_eq!(count, 1);
}
