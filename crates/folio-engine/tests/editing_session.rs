//! End-to-end command sequences through `EditorSession`.

use folio_engine::editing::{BlockType, Cmd, EditorSession, SessionOptions};
use folio_engine::model::invariants;
use folio_engine::selection::point::point_in_block;
use folio_engine::selection::{CellCoord, Direction, Granularity, GridSelection, Selection};
use folio_engine::{ClipboardData, Document, ListKind, Node, format_tree};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

fn session(blocks: Vec<Node>) -> EditorSession {
    EditorSession::new(Document::new(blocks), SessionOptions::default())
}

/// Apply and check the document rules after every step.
fn run(session: &mut EditorSession, cmd: Cmd) {
    session.apply(cmd).unwrap();
    invariants::check(session.document()).unwrap();
}

fn caret_in(session: &EditorSession, block: usize, offset: usize) -> Cmd {
    let doc = session.document();
    Cmd::Select {
        selection: Selection::caret(point_in_block(doc.text_blocks()[block], offset)),
    }
}

fn flat_list() -> Vec<Node> {
    vec![Node::list(
        ListKind::Bullet,
        vec![
            Node::list_item_text("one"),
            Node::list_item_text("two"),
            Node::list_item_text("three"),
        ],
    )]
}

#[test]
fn list_chain_indents_and_outdents_back() {
    let mut s = session(flat_list());
    let original = s.document().clone();

    for block in [1, 1, 2, 2] {
        let select = caret_in(&s, block, 0);
        run(&mut s, select);
        run(&mut s, Cmd::Indent);
    }
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      List bullet start=1
        ListItem value=1
          Text "one"
        ListItem value=2
          List bullet start=1
            ListItem value=1
              List bullet start=1
                ListItem value=1
                  Text "two"
                ListItem value=2
                  Text "three"
    "#);

    for block in [2, 2, 1, 1] {
        let select = caret_in(&s, block, 0);
        run(&mut s, select);
        run(&mut s, Cmd::Outdent);
    }
    assert_eq!(format_tree(s.document()), format_tree(&original));
    assert_eq!(*s.document(), original);
}

#[test]
fn pasted_list_indents_under_first_item() {
    let mut s = EditorSession::default();
    let data = ClipboardData::new().with("text/html", "<ul><li>Hello</li><li>world!</li></ul>");
    run(&mut s, Cmd::Paste { data });
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      List bullet start=1
        ListItem value=1
          Text "Hello"
        ListItem value=2
          Text "world!"
    "#);
    let pasted = s.document().clone();

    run(&mut s, Cmd::Indent);
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      List bullet start=1
        ListItem value=1
          Text "Hello"
        ListItem value=2
          List bullet start=1
            ListItem value=1
              Text "world!"
    "#);

    run(&mut s, Cmd::Outdent);
    assert_eq!(*s.document(), pasted);
}

#[test]
fn code_fence_then_backspace() {
    let mut s = EditorSession::default();
    run(
        &mut s,
        Cmd::InsertText {
            text: "``` alert(1);".to_string(),
        },
    );
    run(&mut s, Cmd::InsertParagraph);
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      CodeBlock language=javascript
        Text "alert(1);"
    "#);

    let start = caret_in(&s, 0, 0);
    run(&mut s, start);
    run(
        &mut s,
        Cmd::DeleteBackward {
            granularity: Granularity::Character,
        },
    );
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      Paragraph
        Text "alert(1);"
    "#);
}

#[test]
fn typing_shortcuts_and_undo() {
    let mut s = EditorSession::default();
    for c in ["#", " ", "T", "i"] {
        run(&mut s, Cmd::InsertText { text: c.to_string() });
    }
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      Heading level=1
        Text "Ti"
    "#);

    // one typing run, one undo step
    run(&mut s, Cmd::Undo);
    assert_eq!(*s.document(), Document::default());
    assert!(!s.can_undo());
    run(&mut s, Cmd::Redo);
    assert_eq!(s.document().text_content(), "Ti");

    run(
        &mut s,
        Cmd::ToggleBlock {
            target: BlockType::Paragraph,
        },
    );
    assert_snapshot!(format_tree(s.document()), @r#"
    Root
      Paragraph
        Text "Ti"
    "#);
}

#[test]
fn grid_corners_in_either_order_select_the_same_cells() {
    let table = Node::table(vec![
        Node::table_row(vec![
            Node::table_cell(vec![Node::paragraph_text("a")]),
            Node::table_cell(vec![Node::paragraph_text("b")]),
        ]),
        Node::table_row(vec![
            Node::table_cell(vec![Node::paragraph_text("c")]),
            Node::table_cell(vec![Node::paragraph_text("d")]),
        ]),
    ]);
    let mut s = session(vec![table, Node::paragraph_text("after")]);
    let key = s.document().root().children()[0].key();

    let backward = GridSelection::new(key, CellCoord::new(1, 1), CellCoord::new(0, 0));
    let forward = GridSelection::new(key, CellCoord::new(0, 0), CellCoord::new(1, 1));
    assert_eq!(backward.cells(s.document()), forward.cells(s.document()));
    assert_eq!(backward.cells(s.document()).len(), 4);

    run(
        &mut s,
        Cmd::SelectCells {
            table: key,
            anchor: CellCoord::new(1, 1),
            focus: CellCoord::new(0, 0),
        },
    );
    let from_backward = s.copy();
    run(
        &mut s,
        Cmd::SelectCells {
            table: key,
            anchor: CellCoord::new(0, 0),
            focus: CellCoord::new(1, 1),
        },
    );
    assert_eq!(s.copy(), from_backward);
    assert_eq!(from_backward.text(), Some("a\tb\nc\td"));
}

#[test]
fn extending_across_cells_becomes_a_grid() {
    let table = Node::table(vec![Node::table_row(vec![
        Node::table_cell(vec![Node::paragraph_text("a")]),
        Node::table_cell(vec![Node::paragraph_text("b")]),
    ])]);
    let mut s = session(vec![table]);
    let start = caret_in(&s, 0, 1);
    run(&mut s, start);
    run(
        &mut s,
        Cmd::Extend {
            direction: Direction::Forward,
            granularity: Granularity::Character,
        },
    );
    let grid = s.selection().as_grid().copied().unwrap();
    assert_eq!((grid.anchor, grid.focus), (CellCoord::new(0, 0), CellCoord::new(0, 1)));
}

#[test]
fn cut_copies_then_deletes() {
    let mut s = session(vec![Node::paragraph_text("cut me")]);
    run(&mut s, Cmd::SelectAll);
    let (data, patch) = s.cut().unwrap();
    assert_eq!(data.text(), Some("cut me"));
    assert_eq!(s.document().text_content(), "");
    assert_eq!(patch.version, s.version());
    assert!(s.can_undo());
    run(&mut s, Cmd::Undo);
    assert_eq!(s.document().text_content(), "cut me");
}
