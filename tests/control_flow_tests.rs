//! Integration tests for jump resolution and non-local exits

mod common;
use common::*;
use esbc::bytecode::{EntryKind, Handler};
use pretty_assertions::assert_eq;

fn ops(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

mod conditionals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_if_else_targets() {
        // if (a) { b } else { c }
        let listing = root_ops(vec![if_(
            ident("a"),
            block(vec![expr(ident("b"))]),
            Some(block(vec![expr(ident("c"))])),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "IFEQ 8, false",
                "RESOLVE b",
                "GET",
                "SAVE",
                "JUMP 11",
                "RESOLVE c",
                "GET",
                "SAVE",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_if_without_else() {
        let listing = root_ops(vec![if_(ident("a"), expr(ident("b")), None)]);
        assert_eq!(
            listing,
            ops(&["RUN", "RESOLVE a", "GET", "IFEQ 7, false", "RESOLVE b", "GET", "SAVE", "COMPLETE"])
        );
    }

    #[test]
    fn test_switch_dispatch_precedes_bodies() {
        // switch (x) { case 1: a; break; default: b; }
        let listing = root_ops(vec![switch(
            ident("x"),
            vec![
                (Some(num(1.0)), vec![expr(ident("a")), break_(None)]),
                (None, vec![expr(ident("b"))]),
            ],
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE x",
                "GET",
                "LITERAL 1",
                "CASE 6",
                "DEFAULT 10",
                "RESOLVE a",
                "GET",
                "SAVE",
                "JUMP 13",
                "RESOLVE b",
                "GET",
                "SAVE",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_switch_without_default_skips_bodies() {
        let listing = root_ops(vec![switch(ident("x"), vec![(Some(num(1.0)), vec![expr(ident("a"))])])]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE x",
                "GET",
                "LITERAL 1",
                "CASE 7",
                "POP",
                "JUMP 10",
                "RESOLVE a",
                "GET",
                "SAVE",
                "COMPLETE",
            ])
        );
    }
}

mod loops {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_while_break_and_continue() {
        // while (a) { if (b) break; continue; }
        let listing = root_ops(vec![while_(
            ident("a"),
            block(vec![if_(ident("b"), break_(None), None), continue_(None)]),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "IFEQ 10, false",
                "RESOLVE b",
                "GET",
                "IFEQ 8, false",
                "JUMP 10",
                "JUMP 1",
                "JUMP 1",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_do_while_loops_back_on_true() {
        let listing = root_ops(vec![serde_json::json!({
            "type": "DoWhileStatement", "body": block(vec![expr(ident("x"))]), "test": ident("a")
        })]);
        assert_eq!(
            listing,
            ops(&["RUN", "RESOLVE x", "GET", "SAVE", "RESOLVE a", "GET", "IFEQ 1, true", "COMPLETE"])
        );
    }

    #[test]
    fn test_for_continue_targets_update() {
        // for (var i = 0; i < 3; i++) { if (i) continue; }
        let program = compiled(vec![serde_json::json!({
            "type": "ForStatement",
            "init": var("i", num(0.0)),
            "test": binary("<", ident("i"), num(3.0)),
            "update": { "type": "UpdateExpression", "operator": "++", "prefix": false, "argument": ident("i") },
            "body": block(vec![if_(ident("i"), continue_(None), None)])
        })]);
        assert_eq!(
            compact(program.listing(program.root().id)),
            ops(&[
                "RUN",
                "LITERAL 0",
                "VAR i",
                "RESOLVE i",
                "GET",
                "LITERAL 3",
                "BINARY 6",
                "IFEQ 16, false",
                "RESOLVE i",
                "GET",
                "IFEQ 12, false",
                "JUMP 12",
                "RESOLVE i",
                "UPDATE 2",
                "POP",
                "JUMP 3",
                "COMPLETE",
            ])
        );
        assert_eq!(program.names(&program.root().var_declared_names), vec!["i"]);
    }

    #[test]
    fn test_for_let_opens_scope() {
        // for (let i = 0;;) break;
        let listing = root_ops(vec![serde_json::json!({
            "type": "ForStatement", "init": let_("i", num(0.0)), "test": null, "update": null,
            "body": break_(None)
        })]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "BLOCK [let i]",
                "LITERAL 0",
                "LET i",
                "JUMP 6",
                "JUMP 4",
                "BLOCK_EXIT",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_block_scoped_continue_leaves_scope() {
        // while (a) { let x = 1; continue; }
        let listing = root_ops(vec![while_(
            ident("a"),
            block(vec![let_("x", num(1.0)), continue_(None)]),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "IFEQ 11, false",
                "BLOCK [let x]",
                "LITERAL 1",
                "LET x",
                "BLOCK_EXIT",
                "JUMP 1",
                "BLOCK_EXIT",
                "JUMP 1",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_for_of_break_lands_on_cleanup() {
        // for (x of xs) { break; }
        let listing = root_ops(vec![for_of(ident("x"), ident("xs"), block(vec![break_(None)]))]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE xs",
                "GET",
                "ITERATE",
                "NEXT 11",
                "RESOLVE x",
                "ROTATE 1",
                "PUT",
                "POP",
                "JUMP 11",
                "JUMP 4",
                "POP",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_for_in_let_binds_in_fresh_scope() {
        // for (let k in o) k;
        let listing = root_ops(vec![for_in(
            serde_json::json!({ "type": "VariableDeclaration", "kind": "let", "declarations": [
                { "type": "VariableDeclarator", "id": ident("k") }
            ] }),
            ident("o"),
            expr(ident("k")),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE o",
                "GET",
                "ENUM",
                "NEXT 12",
                "BLOCK [let k]",
                "LET k",
                "RESOLVE k",
                "GET",
                "SAVE",
                "BLOCK_EXIT",
                "JUMP 4",
                "POP",
                "COMPLETE",
            ])
        );
    }
}

mod labels {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_break_has_no_unwinds() {
        // outer: while (x) { while (y) { break outer; } }
        let listing = root_ops(vec![labeled(
            "outer",
            while_(
                ident("x"),
                block(vec![while_(ident("y"), block(vec![break_(Some("outer"))]))]),
            ),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE x",
                "GET",
                "IFEQ 10, false",
                "RESOLVE y",
                "GET",
                "IFEQ 9, false",
                "JUMP 10",
                "JUMP 4",
                "JUMP 1",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_labeled_block_break() {
        // foo: { a; break foo; b; }
        let listing = root_ops(vec![labeled(
            "foo",
            block(vec![expr(ident("a")), break_(Some("foo")), expr(ident("b"))]),
        )]);
        assert_eq!(
            listing,
            ops(&["RUN", "RESOLVE a", "GET", "SAVE", "JUMP 8", "RESOLVE b", "GET", "SAVE", "COMPLETE"])
        );
    }

    #[test]
    fn test_labeled_continue_to_outer_loop() {
        // outer: while (x) { while (y) { continue outer; } }
        let listing = root_ops(vec![labeled(
            "outer",
            while_(
                ident("x"),
                block(vec![while_(ident("y"), block(vec![continue_(Some("outer"))]))]),
            ),
        )]);
        assert_eq!(listing[7], "JUMP 1");
    }

    #[test]
    fn test_label_can_be_reused_after_its_statement() {
        let result = compile_body(vec![
            labeled("l", while_(ident("a"), break_(Some("l")))),
            labeled("l", while_(ident("b"), break_(Some("l")))),
        ]);
        assert!(result.is_ok());
    }
}

mod unwinding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_with_scope_is_exited_on_break() {
        // while (a) { with (o) { break; } }
        let listing = root_ops(vec![while_(
            ident("a"),
            block(vec![serde_json::json!({
                "type": "WithStatement", "object": ident("o"), "body": block(vec![break_(None)])
            })]),
        )]);
        assert_eq!(
            listing,
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "IFEQ 11, false",
                "RESOLVE o",
                "GET",
                "WITH",
                "BLOCK_EXIT",
                "JUMP 11",
                "BLOCK_EXIT",
                "JUMP 1",
                "COMPLETE",
            ])
        );
    }

    #[test]
    fn test_return_pops_every_iterator() {
        // function f(o) { for (var k in o) { for (var v of o) { return v; } } }
        let program = compiled(vec![function_decl(
            "f",
            vec![ident("o")],
            vec![for_in(
                declare("var", ident("k"), None),
                ident("o"),
                block(vec![for_of(
                    declare("var", ident("v"), None),
                    ident("o"),
                    block(vec![return_(Some(ident("v")))]),
                )]),
            )],
        )]);
        let listing = unit_ops(&program, "f");
        assert_eq!(
            listing,
            ops(&[
                "RESOLVE o",
                "GET",
                "ENUM",
                "NEXT 20",
                "VAR k",
                "RESOLVE o",
                "GET",
                "ITERATE",
                "NEXT 18",
                "VAR v",
                "RESOLVE v",
                "GET",
                "ROTATE 1",
                "POP",
                "ROTATE 1",
                "POP",
                "RETURN",
                "JUMP 8",
                "POP",
                "JUMP 3",
                "POP",
                "UNDEFINED",
                "RETURN",
            ])
        );
        let f = program.units().iter().find(|u| u.name.is_some()).unwrap();
        assert_eq!(program.names(&f.var_declared_names), vec!["k", "v"]);
    }

    #[test]
    fn test_break_through_finally_calls_subroutine() {
        // while (a) { try { break; } finally { b; } }
        let program = compiled(vec![while_(
            ident("a"),
            block(vec![try_(vec![break_(None)], None, Some(vec![expr(ident("b"))]))]),
        )]);
        assert_eq!(
            compact(program.listing(program.root().id)),
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "IFEQ 16, false",
                "JSR 11, false",
                "JUMP 16",
                "JUMP 9",
                "JSR 11, false",
                "THROW",
                "JSR 11, false",
                "JUMP 15",
                "RESOLVE b",
                "GET",
                "SAVE",
                "RET",
                "JUMP 1",
                "COMPLETE",
            ])
        );
        assert_eq!(
            program.root().entry_regions,
            vec![Handler { kind: EntryKind::TryCatch, begin: 4, end: 6 }]
        );
    }

    #[test]
    fn test_return_through_finally_flags_return() {
        // function f() { try { return 1; } finally { g(); } }
        let program = compiled(vec![function_decl(
            "f",
            vec![],
            vec![try_(
                vec![return_(Some(num(1.0)))],
                None,
                Some(vec![expr(call(ident("g"), vec![]))]),
            )],
        )]);
        assert_eq!(
            unit_ops(&program, "f"),
            ops(&[
                "LITERAL 1",
                "JSR 8, true",
                "RETURN",
                "JUMP 6",
                "JSR 8, false",
                "THROW",
                "JSR 8, false",
                "JUMP 14",
                "RESOLVE g",
                "DUP",
                "GET",
                "CALL 0",
                "POP",
                "RET",
                "UNDEFINED",
                "RETURN",
            ])
        );
    }

    #[test]
    fn test_return_inside_finally_drops_activation() {
        // function f() { try {} finally { return 2; } }
        let program = compiled(vec![function_decl(
            "f",
            vec![],
            vec![try_(vec![], None, Some(vec![return_(Some(num(2.0)))]))],
        )]);
        assert_eq!(
            unit_ops(&program, "f"),
            ops(&[
                "JUMP 3",
                "JSR 5, false",
                "THROW",
                "JSR 5, false",
                "JUMP 10",
                "LITERAL 2",
                "ROTATE 3",
                "POPN 3",
                "RETURN",
                "RET",
                "UNDEFINED",
                "RETURN",
            ])
        );
    }

    #[test]
    fn test_try_catch_regions() {
        // try { a; } catch (e) { e; }
        let program = compiled(vec![try_(
            vec![expr(ident("a"))],
            Some(("e", vec![expr(ident("e"))])),
            None,
        )]);
        assert_eq!(
            compact(program.listing(program.root().id)),
            ops(&[
                "RUN",
                "RESOLVE a",
                "GET",
                "SAVE",
                "JUMP 11",
                "BLOCK [let e]",
                "LET e",
                "RESOLVE e",
                "GET",
                "SAVE",
                "BLOCK_EXIT",
                "COMPLETE",
            ])
        );
        assert_eq!(
            program.root().entry_regions,
            vec![
                Handler { kind: EntryKind::TryCatch, begin: 1, end: 4 },
                Handler { kind: EntryKind::Env, begin: 5, end: 11 },
            ]
        );
    }

    #[test]
    fn test_every_unit_falls_through() {
        let program = compiled(vec![
            function_decl("f", vec![], vec![return_(Some(num(1.0)))]),
            expr(arrow(vec![], block(vec![]))),
        ]);
        for unit in program.units() {
            let listing = compact(program.listing(unit.id));
            if unit.kind.completes() {
                assert_eq!(listing.last().map(String::as_str), Some("COMPLETE"));
            } else {
                assert_eq!(&listing[listing.len() - 2..], &["UNDEFINED", "RETURN"]);
            }
        }
    }
}
