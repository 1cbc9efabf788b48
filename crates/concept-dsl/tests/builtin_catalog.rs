//! Parsing realistic scripts against the embedded catalog.

use concept_dsl::{ConceptCatalog, ConceptMetadata, DslParser, Lexer, TokenKind};
use pretty_assertions::assert_eq;

const SCRIPT: &str = r#"// Shop model
Module Shop
{
    Entity Book
    {
        ShortString Title { Required; }
        Reference Author Shop.Person;
        ItemFilter Expensive 'item => item.Price > 100';
    }

    Browse BookGrid Shop.Book
    {
        Take Title;
        Take AuthorName Author.Name;
    }
}
"#;

#[test]
fn parses_script_in_source_order() {
    let catalog = ConceptCatalog::builtin().unwrap();
    let parsed = DslParser::new(&catalog).parse_script(SCRIPT).unwrap();

    let rendered: Vec<String> = parsed.iter().map(|c| c.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "Module Shop",
            "Entity Book",
            "ShortString Title",
            "Required",
            "Reference Author Shop.Person",
            "ItemFilter Expensive item => item.Price > 100",
            "Browse BookGrid Shop.Book",
            "Take Title",
            "Take AuthorName Author.Name",
        ]
    );

    let take_types: Vec<&str> = parsed
        .iter()
        .filter(|c| c.concept_type.matches_keyword("Take"))
        .map(|c| c.type_name())
        .collect();
    assert_eq!(take_types, vec!["BrowseTakeInfo", "BrowseTakeNamedInfo"]);
}

#[test]
fn comments_are_skipped_by_the_parser() {
    let first = Lexer::new(SCRIPT).next().unwrap().unwrap();
    assert_eq!(first.kind, TokenKind::Comment);
    assert_eq!(first.value, " Shop model");
    assert_eq!((first.start, first.end), (0, 13));

    let tokens = concept_dsl::tokenize(SCRIPT).unwrap();
    assert!(tokens.iter().all(|t| t.kind != TokenKind::Comment));

    let catalog = ConceptCatalog::builtin().unwrap();
    let parsed = DslParser::new(&catalog)
        .parse_script("// leading\nModule M; // trailing\n")
        .unwrap();
    assert_eq!(parsed.len(), 1);
}

#[test]
fn every_keyword_has_a_signature() {
    let catalog = ConceptCatalog::builtin().unwrap();
    for ty in catalog.types() {
        let Some(keyword) = ty.keyword.as_deref() else {
            continue;
        };
        let signatures = catalog.signatures_of(keyword);
        assert!(
            signatures.iter().any(|s| s.concept_type == ty.name),
            "no signature for {}",
            ty.name
        );
        assert!(catalog.description_of(keyword).contains(&ty.signature()));
    }
}

#[test]
fn nested_concept_outside_its_parent_is_rejected() {
    let catalog = ConceptCatalog::builtin().unwrap();
    let err = DslParser::new(&catalog)
        .parse_script("Module Shop { Take Title; }")
        .unwrap_err();
    assert!(err.message.contains("not allowed inside \"Module Shop\""), "{}", err.message);
}
