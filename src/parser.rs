use crate::ir::{FamilyGraph, Gender, Member, RelationshipEdge};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(familytree|family)$").unwrap());
static MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:member|person)\s+(?P<id>[\w.\-]+)(?:\s+"(?P<name>[^"]*)")?(?P<rest>.*)$"#)
        .unwrap()
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>born|died|image)=(?:"(?P<quoted>[^"]*)"|(?P<bare>\S+))"#).unwrap()
});
static RELATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>spouse|partner|parent)\s+(?P<a>[\w.\-]+)\s+(?P<b>[\w.\-]+)$").unwrap()
});
static SPOUSE_ARROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<a>[\w.\-]+)\s*==\s*(?P<b>[\w.\-]+)$").unwrap());
static PARENT_ARROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<a>[\w.\-]+)\s*-->\s*(?P<b>[\w.\-]+)$").unwrap());

/// Parses a family document: a JSON/JSON5 object, or the line-oriented text form.
pub fn parse_family(input: &str) -> Result<FamilyGraph> {
    let trimmed = input.trim_start_matches('\u{feff}').trim();
    let mut graph = if looks_like_json(trimmed) {
        parse_json_document(trimmed)?
    } else {
        parse_text_document(trimmed)?
    };
    dedupe_members(&mut graph);
    Ok(graph)
}

/// JSON5 documents may open with `//` comment lines before the top-level object.
fn looks_like_json(input: &str) -> bool {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("//"))
        .is_some_and(|line| line.starts_with('{'))
}

fn parse_json_document(input: &str) -> Result<FamilyGraph> {
    json5::from_str::<FamilyGraph>(input)
        .map_err(|err| anyhow::anyhow!("invalid family document: {err}"))
}

fn parse_text_document(input: &str) -> Result<FamilyGraph> {
    let mut graph = FamilyGraph::new();
    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("%%") {
            continue;
        }
        if HEADER_RE.is_match(line) {
            if graph.members.is_empty() && graph.edges.is_empty() {
                continue;
            }
            return Err(anyhow::anyhow!(
                "line {line_no}: header must come before any member or relation"
            ));
        }
        // Arrows first: an id may itself be the word `member` or `person`.
        if let Some(caps) = SPOUSE_ARROW_RE.captures(line) {
            graph.edges.push(RelationshipEdge::spouse(&caps["a"], &caps["b"]));
            continue;
        }
        if let Some(caps) = PARENT_ARROW_RE.captures(line) {
            graph.edges.push(RelationshipEdge::parent(&caps["a"], &caps["b"]));
            continue;
        }
        if let Some(caps) = MEMBER_RE.captures(line) {
            let member = parse_member(&caps).map_err(|err| anyhow::anyhow!("line {line_no}: {err}"))?;
            graph.members.push(member);
            continue;
        }
        if let Some(caps) = RELATION_RE.captures(line) {
            let (a, b) = (&caps["a"], &caps["b"]);
            let edge = match &caps["kind"] {
                "parent" => RelationshipEdge::parent(a, b),
                _ => RelationshipEdge::spouse(a, b),
            };
            graph.edges.push(edge);
            continue;
        }
        return Err(anyhow::anyhow!("line {line_no}: unrecognized statement '{line}'"));
    }
    Ok(graph)
}

fn parse_member(caps: &regex::Captures<'_>) -> Result<Member> {
    let id = &caps["id"];
    let name = caps
        .name("name")
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| id.to_string());
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");

    let mut member = Member::new(id, name, Gender::Unknown);
    for attr in ATTR_RE.captures_iter(rest) {
        let value = attr
            .name("quoted")
            .or_else(|| attr.name("bare"))
            .map(|m| m.as_str().to_string());
        match &attr["key"] {
            "born" => member.date_of_birth = value,
            "died" => member.date_of_death = value,
            _ => member.image_ref = value,
        }
    }

    let leftover = ATTR_RE.replace_all(rest, "");
    let mut words = leftover.split_whitespace();
    if let Some(word) = words.next() {
        member.gender = Gender::from_token(word);
    }
    if let Some(extra) = words.next() {
        return Err(anyhow::anyhow!("unexpected token '{extra}' for member '{id}'"));
    }
    Ok(member)
}

/// Keeps the first member for every id.
fn dedupe_members(graph: &mut FamilyGraph) {
    let mut seen = HashSet::new();
    graph.members.retain(|member| seen.insert(member.id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EdgeKind;

    #[test]
    fn parses_json_documents() {
        let graph = parse_family(
            r#"{
              "members": [
                {"id": "a", "name": "Ada", "gender": "FEMALE", "dateOfBirth": "1815-12-10"},
                {"id": "b", "name": "William", "gender": "male"}
              ],
              "edges": [{"fromId": "a", "toId": "b", "kind": "SPOUSE"}]
            }"#,
        )
        .unwrap();
        assert_eq!(graph.members.len(), 2);
        assert_eq!(graph.members[0].gender, Gender::Female);
        assert_eq!(graph.members[0].date_of_birth.as_deref(), Some("1815-12-10"));
        assert_eq!(graph.edges, vec![RelationshipEdge::spouse("a", "b")]);
    }

    #[test]
    fn json5_accepts_comments_and_aliases() {
        let graph = parse_family(
            r#"{
              // exported from the tree editor
              members: [{id: 'p', name: 'Parent'}, {id: 'c', name: 'Child', gender: 'x'},],
              connections: [{fromId: 'p', toId: 'c', type: 'parent'}],
            }"#,
        )
        .unwrap();
        assert_eq!(graph.members[1].gender, Gender::Unknown);
        assert_eq!(graph.edges[0].kind, EdgeKind::Parent);
    }

    #[test]
    fn leading_json5_comments_are_not_text() {
        let graph = parse_family("// exported\n// v2\n{members: [{id: 'a'}]}").unwrap();
        assert_eq!(graph.members[0].id, "a");
        assert_eq!(graph.members[0].name, "");
    }

    #[test]
    fn parses_text_documents() {
        let input = r#"
familytree
%% the Lovelace household
member ada "Ada Lovelace" female born=1815-12-10 died=1852-11-27 image="portraits/ada.png"
member william "William King" m
member byron
spouse ada william
parent ada byron
william --> byron
ada == william
"#;
        let graph = parse_family(input).unwrap();
        assert_eq!(graph.members.len(), 3);
        let ada = graph.member("ada").unwrap();
        assert_eq!(ada.name, "Ada Lovelace");
        assert_eq!(ada.gender, Gender::Female);
        assert_eq!(ada.date_of_death.as_deref(), Some("1852-11-27"));
        assert_eq!(ada.image_ref.as_deref(), Some("portraits/ada.png"));
        assert_eq!(graph.member("william").unwrap().gender, Gender::Male);
        assert_eq!(graph.member("byron").unwrap().name, "byron");
        assert_eq!(
            graph.edges,
            vec![
                RelationshipEdge::spouse("ada", "william"),
                RelationshipEdge::parent("ada", "byron"),
                RelationshipEdge::parent("william", "byron"),
                RelationshipEdge::spouse("ada", "william"),
            ]
        );
    }

    #[test]
    fn keyword_ids_work_in_arrow_statements() {
        let graph = parse_family(
            "member member \"Mo\"\nmember person\nmember kid\nmember --> kid\nperson == member\n",
        )
        .unwrap();
        assert_eq!(graph.members.len(), 3);
        assert_eq!(graph.member("member").unwrap().name, "Mo");
        assert_eq!(
            graph.edges,
            vec![
                RelationshipEdge::parent("member", "kid"),
                RelationshipEdge::spouse("person", "member"),
            ]
        );
    }

    #[test]
    fn reports_line_of_unknown_statement() {
        let err = parse_family("member a\nsibling a b\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn rejects_trailing_member_tokens() {
        let err = parse_family("member a \"A\" female tall").unwrap_err();
        assert!(err.to_string().contains("tall"), "{err}");
    }

    #[test]
    fn duplicate_members_keep_first() {
        let graph = parse_family("member a \"First\"\nmember a \"Second\"\n").unwrap();
        assert_eq!(graph.members.len(), 1);
        assert_eq!(graph.members[0].name, "First");
    }

    #[test]
    fn empty_input_is_an_empty_graph() {
        let graph = parse_family("  \n").unwrap();
        assert!(graph.members.is_empty());
        assert!(graph.edges.is_empty());
    }
}
