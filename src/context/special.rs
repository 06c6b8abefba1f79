//! Token-driven special cases that run before clause routing.
//!
//! These detectors do not depend on clause positions at all, so they keep
//! working when the parser could not produce structure. Each returns
//! `Some` only when its pattern holds around the cursor; the classifier
//! tries them in a fixed order.

use crate::context::types::{ContextHints, ContextType, CursorContext, Mode, PseudoTable};
use crate::cursor::{left_side_before, prev_meaningful, token_index_before};
use crate::sql::{Keyword, Token, TokenKind};

/// The byte position scans should anchor on: the start of the token being
/// typed when the cursor sits inside one, the cursor itself otherwise.
pub(crate) fn anchor_offset(tokens: &[Token], offset: usize) -> usize {
    tokens
        .iter()
        .find(|t| t.contains(offset))
        .filter(|t| t.kind.is_ident() || matches!(t.kind, TokenKind::Keyword(_)))
        .map(|t| t.start)
        .unwrap_or(offset)
}

/// Matches `inserted` / `deleted` as keyword or bare identifier.
fn pseudo_table(token: &Token) -> Option<PseudoTable> {
    match &token.kind {
        TokenKind::Keyword(Keyword::Inserted) => Some(PseudoTable::Inserted),
        TokenKind::Keyword(Keyword::Deleted) => Some(PseudoTable::Deleted),
        TokenKind::Ident(s) if s.eq_ignore_ascii_case("inserted") => Some(PseudoTable::Inserted),
        TokenKind::Ident(s) if s.eq_ignore_ascii_case("deleted") => Some(PseudoTable::Deleted),
        _ => None,
    }
}

/// Backward from `from_idx`: is there an enclosing OUTPUT clause, i.e. an
/// `OUTPUT` keyword at this depth or shallower before any keyword that
/// would have ended the clause?
fn inside_output_clause(tokens: &[Token], from_idx: usize) -> bool {
    let mut bal = 0i32;
    let mut i = from_idx;
    loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => bal -= 1,
            TokenKind::Keyword(Keyword::Output) if bal <= 0 => return true,
            TokenKind::Keyword(
                Keyword::Into
                | Keyword::Values
                | Keyword::Select
                | Keyword::From
                | Keyword::Where
                | Keyword::Set,
            ) if bal <= 0 => return false,
            _ => {}
        }
        if i == 0 {
            return false;
        }
        i -= 1;
    }
}

/// `OUTPUT INSERTED.│` / `OUTPUT DELETED.│`: columns of the statement's
/// target table through the pseudo-table.
pub fn output_pseudo(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let last = token_index_before(tokens, a)?;
    if !matches!(tokens[last].kind, TokenKind::Dot) {
        return None;
    }
    let ps = prev_meaningful(tokens, last)?;
    let pseudo = pseudo_table(&tokens[ps])?;
    if !inside_output_clause(tokens, ps) {
        return None;
    }
    Some(
        CursorContext::new(ContextType::Column, Mode::Output).with_hints(ContextHints {
            is_output_clause: true,
            output_pseudo_table: Some(pseudo),
            table_ref: Some(pseudo.to_string()),
            omit_table: true,
            ..Default::default()
        }),
    )
}

/// `OUTPUT … INTO │`: the receiving table of an OUTPUT clause.
pub fn output_into(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let last = token_index_before(tokens, a)?;
    if !tokens[last].is_keyword(Keyword::Into) {
        return None;
    }
    let before = prev_meaningful(tokens, last)?;
    if !inside_output_clause(tokens, before) {
        return None;
    }
    Some(
        CursorContext::new(ContextType::Table, Mode::Into).with_hints(ContextHints {
            is_output_clause: true,
            ..Default::default()
        }),
    )
}

/// First dotted identifier run at or after `from`, as a qualified path.
fn forward_path(tokens: &[Token], from: usize) -> Option<String> {
    let start = (from..tokens.len()).find(|&i| tokens[i].kind.is_ident())?;
    let mut parts = vec![tokens[start].name()?];
    let mut i = start + 1;
    while i + 1 < tokens.len()
        && matches!(tokens[i].kind, TokenKind::Dot)
        && tokens[i + 1].kind.is_ident()
    {
        parts.push(tokens[i + 1].name()?);
        i += 2;
    }
    Some(parts.join("."))
}

/// `EXEC │`, `EXEC dbo.│` (procedure name position) and
/// `EXEC dbo.Proc │` (parameter position).
pub fn exec_context(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let mut past_name = false;
    let mut i = match token_index_before(tokens, a) {
        Some(i) => i,
        None => return None,
    };
    // a gap between a finished name and the cursor means arguments begin
    if tokens[i].kind.is_ident() && tokens[i].end < a {
        past_name = true;
    }

    loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::Keyword(Keyword::Exec | Keyword::Execute) => {
                if past_name {
                    let path = forward_path(tokens, i + 1)?;
                    return Some(
                        CursorContext::new(ContextType::Parameter, Mode::ExecParams).with_hints(
                            ContextHints {
                                table_ref: Some(path),
                                ..Default::default()
                            },
                        ),
                    );
                }
                let mut hints = ContextHints::default();
                let (qn, _) = crate::cursor::dotted_name_before(tokens, a);
                let q = qn.for_table_context();
                if let Some(schema) = q.schema {
                    hints.potential_database = Some(schema.clone());
                    hints.filter_schema = Some(schema);
                    hints.omit_schema = true;
                }
                hints.filter_database = q.database;
                return Some(
                    CursorContext::new(ContextType::Procedure, Mode::Exec).with_hints(hints),
                );
            }
            kind if kind.is_ident() => {
                // two separate identifier runs mean the name is finished
                if let Some(p) = prev_meaningful(tokens, i)
                    && tokens[p].kind.is_ident()
                {
                    past_name = true;
                }
            }
            TokenKind::Dot => {}
            TokenKind::Comma
            | TokenKind::Number(_)
            | TokenKind::StringLit(_)
            | TokenKind::Operator(_) => past_name = true,
            kind if kind.is_comment() => {}
            _ => return None,
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    }
}

/// Collect a dotted path ending at `idx` walking backward. Returns the
/// parts in source order and the index of the token before the path.
fn dotted_path_backward(tokens: &[Token], idx: usize) -> Option<(Vec<String>, Option<usize>)> {
    let mut parts_rev = vec![tokens[idx].name()?];
    let mut i = idx;
    loop {
        let Some(dot) = prev_meaningful(tokens, i) else {
            return Some((reversed(parts_rev), None));
        };
        if !matches!(tokens[dot].kind, TokenKind::Dot) {
            return Some((reversed(parts_rev), Some(dot)));
        }
        let Some(part) = prev_meaningful(tokens, dot) else {
            return Some((reversed(parts_rev), None));
        };
        let Some(name) = tokens[part].name() else {
            return Some((reversed(parts_rev), Some(part)));
        };
        parts_rev.push(name);
        i = part;
    }
}

fn reversed(mut v: Vec<String>) -> Vec<String> {
    v.reverse();
    v
}

/// Split a path into (database, schema, name) by part count.
fn split_path(mut parts: Vec<String>) -> (Option<String>, Option<String>, String) {
    let name = parts.pop().unwrap_or_default();
    let schema = parts.pop();
    let database = parts.pop();
    (database, schema, name)
}

/// `INSERT INTO t (a, b, │ …)`: the parenthesized column list before any
/// VALUES.
pub fn insert_columns(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let mut bal = 0i32;
    let mut i = token_index_before(tokens, a)?;
    let open = loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => {
                bal -= 1;
                if bal < 0 {
                    break i;
                }
            }
            TokenKind::Keyword(
                Keyword::Values | Keyword::Select | Keyword::From | Keyword::Where | Keyword::Set,
            ) if bal == 0 => return None,
            _ => {}
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    };

    let path_end = prev_meaningful(tokens, open)?;
    let (parts, before) = dotted_path_backward(tokens, path_end)?;
    let into_idx = before?;
    if !tokens[into_idx].is_keyword(Keyword::Into) {
        return None;
    }
    let insert_idx = prev_meaningful(tokens, into_idx)?;
    if !tokens[insert_idx].is_keyword(Keyword::Insert) {
        return None;
    }

    let (_, insert_schema, insert_table) = split_path(parts);
    Some(
        CursorContext::new(ContextType::Column, Mode::InsertColumns).with_hints(ContextHints {
            insert_table: Some(insert_table),
            insert_schema,
            ..Default::default()
        }),
    )
}

/// `MERGE … WHEN NOT MATCHED THEN INSERT (a, │)`: walks backward
/// tracking paren depth so a `USING (SELECT …)` group cannot confuse the
/// pattern.
pub fn merge_insert_columns(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let mut bal = 0i32;
    let mut i = token_index_before(tokens, a)?;
    let open = loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => {
                bal -= 1;
                if bal < 0 {
                    break i;
                }
            }
            TokenKind::Keyword(Keyword::Values | Keyword::Select) if bal == 0 => return None,
            _ => {}
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    };

    let insert_idx = prev_meaningful(tokens, open)?;
    if !tokens[insert_idx].is_keyword(Keyword::Insert) {
        return None;
    }
    let then_idx = prev_meaningful(tokens, insert_idx)?;
    if !tokens[then_idx].is_keyword(Keyword::Then) {
        return None;
    }
    Some(
        CursorContext::new(ContextType::Column, Mode::MergeInsertColumns).with_hints(
            ContextHints {
                is_merge_insert: true,
                ..Default::default()
            },
        ),
    )
}

/// Cursor within a JOIN's ON expression. Verifies the nearest unmatched
/// backward `ON` actually belongs to a `JOIN` (and not, say, a MERGE).
pub fn on_clause(tokens: &[Token], offset: usize) -> Option<CursorContext> {
    let a = anchor_offset(tokens, offset);
    let mut bal = 0i32;
    let mut i = token_index_before(tokens, a)?;
    let on_idx = loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => bal -= 1,
            TokenKind::Keyword(Keyword::On) if bal <= 0 => break i,
            TokenKind::Keyword(
                Keyword::Where
                | Keyword::Group
                | Keyword::Having
                | Keyword::Order
                | Keyword::Select
                | Keyword::From
                | Keyword::Set
                | Keyword::Values
                | Keyword::Output
                | Keyword::When,
            ) if bal <= 0 => return None,
            _ => {}
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    };

    // the ON must follow `JOIN <ref> [alias]`
    let mut j = on_idx;
    let join_ok = loop {
        let Some(p) = prev_meaningful(tokens, j) else {
            break false;
        };
        match &tokens[p].kind {
            TokenKind::Keyword(Keyword::Join) => break true,
            TokenKind::Keyword(Keyword::As) => {}
            TokenKind::Keyword(kw) if kw.is_join_qualifier() => {}
            TokenKind::Dot | TokenKind::ParenClose | TokenKind::ParenOpen => {}
            kind if kind.is_ident() => {}
            kind if kind.is_comment() => {}
            _ => break false,
        }
        j = p;
    };
    if !join_ok {
        return None;
    }

    let (qn, triggered) = crate::cursor::dotted_name_before(tokens, a);
    if triggered && let Some(q) = qn.single_qualifier() {
        return Some(
            CursorContext::new(ContextType::Column, Mode::Qualified).with_hints(ContextHints {
                table_ref: Some(q.to_string()),
                filter_table: Some(q.to_string()),
                omit_table: true,
                ..Default::default()
            }),
        );
    }
    Some(
        CursorContext::new(ContextType::Column, Mode::On).with_hints(ContextHints {
            left_side: left_side_before(tokens, offset),
            ..Default::default()
        }),
    )
}
