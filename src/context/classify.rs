//! The cursor-context classifier: a fixed, ordered pipeline.
//!
//! Order is part of the contract:
//! 1. string/comment gate
//! 2. token-driven special cases (OUTPUT, EXEC, INSERT/MERGE column
//!    lists, JOIN-ON)
//! 3. clause-driven routing from parsed regions (with unparsed-subquery
//!    descent in WHERE/HAVING)
//! 4.-11. prioritized token-based fallback: FROM/JOIN continuation, alias
//!    disambiguation, table contexts, column contexts, VALUES position,
//!    USE/dangling-database, keyword fallback.
//!
//! The classifier never blocks and never touches metadata.

use crate::context::special;
use crate::context::types::{ContextHints, ContextType, CursorContext, Mode};
use crate::cursor::{
    dotted_name_before, inside_string_or_comment, left_side_before, prefix_and_trigger,
    prev_meaningful, token_index_before,
};
use crate::parse::{Clause, StatementChunk, StatementKind, TableReference, chunk_at};
use crate::sql::{Keyword, Position, Token, TokenKind, TokenStream};

/// Table-producing context families and their mode variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFamily {
    From,
    Join,
    Into,
    Update,
    Delete,
    Merge,
}

impl TableFamily {
    fn modes(self) -> (Mode, Mode, Mode) {
        match self {
            TableFamily::From => (Mode::From, Mode::FromQualified, Mode::FromCrossDbQualified),
            TableFamily::Join => (Mode::Join, Mode::JoinQualified, Mode::JoinCrossDbQualified),
            TableFamily::Into => (Mode::Into, Mode::IntoQualified, Mode::IntoCrossDbQualified),
            TableFamily::Update => (Mode::Update, Mode::Update, Mode::Update),
            TableFamily::Delete => (Mode::Delete, Mode::Delete, Mode::Delete),
            TableFamily::Merge => (Mode::Merge, Mode::Merge, Mode::Merge),
        }
    }
}

/// Classify the completion context at `pos`.
pub fn classify(
    text: &str,
    stream: &TokenStream,
    chunks: &[StatementChunk],
    pos: Position,
) -> CursorContext {
    let Some(offset) = stream.offset_at(text, pos) else {
        return CursorContext::suppressed(Mode::General);
    };

    // 1. string/comment gate
    if let Some(t) = inside_string_or_comment(stream, offset) {
        let mode = if t.kind.is_comment() {
            Mode::Comment
        } else {
            Mode::StringLit
        };
        return CursorContext::suppressed(mode);
    }

    let (prefix, trigger) = prefix_and_trigger(text, stream, offset);

    let Some(outer) = chunk_at(chunks, offset) else {
        let mut ctx = CursorContext::new(ContextType::Keyword, Mode::Start);
        ctx.prefix = prefix;
        ctx.trigger = trigger;
        return ctx;
    };
    let chunk = outer.innermost_at(offset);
    let tokens = &stream.tokens()[chunk.token_range.clone()];

    // 2. special cases, in order
    let special = special::output_pseudo(tokens, offset)
        .or_else(|| special::output_into(tokens, offset))
        .or_else(|| special::exec_context(tokens, offset))
        .or_else(|| special::insert_columns(tokens, offset))
        .or_else(|| special::merge_insert_columns(tokens, offset))
        .or_else(|| special::on_clause(tokens, offset));
    if let Some(ctx) = special {
        return attach_env(ctx, outer, chunk, prefix, trigger);
    }

    // 3. clause-driven routing
    if let Some(clause) = chunk.clause_at(pos) {
        let routed = route_clause(clause, tokens, offset, chunk);
        if let Some(ctx) = routed {
            return attach_env(ctx, outer, chunk, prefix, trigger);
        }
    }

    // 4.-11. token-based fallback
    let ctx = token_fallback(tokens, offset, chunk);
    attach_env(ctx, outer, chunk, prefix, trigger)
}

/// Map a parsed clause region to a context, or `None` to defer to the
/// token fallback.
fn route_clause(
    clause: Clause,
    tokens: &[Token],
    offset: usize,
    chunk: &StatementChunk,
) -> Option<CursorContext> {
    match clause {
        Clause::Select => Some(column_context(Mode::Select, tokens, offset, false)),
        Clause::From => {
            // `FROM t LEFT │` continues as a JOIN context
            let family = if join_qualifier_precedes(tokens, offset) {
                TableFamily::Join
            } else {
                TableFamily::From
            };
            Some(table_context(family, tokens, offset))
        }
        Clause::Join => Some(table_context(TableFamily::Join, tokens, offset)),
        Clause::On => Some(column_context(Mode::On, tokens, offset, true)),
        Clause::Where | Clause::Having => {
            let mode = if clause == Clause::Where {
                Mode::Where
            } else {
                Mode::Having
            };
            // an unparsed `( SELECT …` enclosing the cursor swaps the
            // scope to the inner query and re-detects from tokens
            if let Some(sub_tables) = unparsed_subquery_tables(tokens, offset) {
                let mut ctx = token_fallback(tokens, offset, chunk);
                ctx.subquery_tables = sub_tables;
                return Some(ctx);
            }
            Some(column_context(mode, tokens, offset, true))
        }
        Clause::GroupBy => Some(column_context(Mode::GroupBy, tokens, offset, false)),
        Clause::OrderBy => Some(column_context(Mode::OrderBy, tokens, offset, false)),
        Clause::Set => Some(set_context(tokens, offset)),
        Clause::Values => Some(values_context(tokens, offset)),
        Clause::Into => {
            let family = if chunk.kind == StatementKind::Merge {
                TableFamily::Merge
            } else {
                TableFamily::Into
            };
            Some(table_context(family, tokens, offset))
        }
        Clause::InsertColumns => {
            // normally handled by the special case; fall back to the
            // statement's target when regions exist but tokens are odd
            let target = chunk.tables.first();
            Some(
                CursorContext::new(ContextType::Column, Mode::InsertColumns).with_hints(
                    ContextHints {
                        insert_table: target.map(|t| t.name.clone()),
                        insert_schema: target.and_then(|t| t.schema.clone()),
                        ..Default::default()
                    },
                ),
            )
        }
        Clause::Using => Some(table_context(TableFamily::From, tokens, offset)),
        Clause::MergeInsertColumns => Some(
            CursorContext::new(ContextType::Column, Mode::MergeInsertColumns).with_hints(
                ContextHints {
                    is_merge_insert: true,
                    ..Default::default()
                },
            ),
        ),
    }
}

/// True when the nearest meaningful token before the cursor is a JOIN
/// qualifier (`INNER`, `LEFT`, …).
fn join_qualifier_precedes(tokens: &[Token], offset: usize) -> bool {
    let a = special::anchor_offset(tokens, offset);
    token_index_before(tokens, a)
        .and_then(|i| {
            if tokens[i].kind.is_comment() {
                prev_meaningful(tokens, i)
            } else {
                Some(i)
            }
        })
        .is_some_and(|i| {
            matches!(&tokens[i].kind, TokenKind::Keyword(kw) if kw.is_join_qualifier())
        })
}

/// Table context with dot-qualification extraction.
fn table_context(family: TableFamily, tokens: &[Token], offset: usize) -> CursorContext {
    let (qn, _) = dotted_name_before(tokens, offset);
    let q = qn.for_table_context();
    let (base, qualified, cross_db) = family.modes();
    let mut hints = ContextHints::default();

    let mode = match (&q.database, &q.schema) {
        (Some(db), Some(schema)) => {
            hints.filter_database = Some(db.clone());
            hints.filter_schema = Some(schema.clone());
            hints.omit_schema = true;
            cross_db
        }
        (None, Some(schema)) => {
            hints.filter_schema = Some(schema.clone());
            hints.potential_database = Some(schema.clone());
            hints.omit_schema = true;
            qualified
        }
        _ => base,
    };
    CursorContext::new(ContextType::Table, mode).with_hints(hints)
}

/// Column context; resolves `alias.│` to qualified mode and extracts the
/// comparison left side where the mode calls for it.
fn column_context(
    mode: Mode,
    tokens: &[Token],
    offset: usize,
    want_left_side: bool,
) -> CursorContext {
    let (qn, _) = dotted_name_before(tokens, offset);
    let quals = qn.qualifiers();
    if let Some(last) = quals.last() {
        let mut hints = ContextHints {
            table_ref: Some(last.clone()),
            filter_table: Some(last.clone()),
            omit_table: true,
            ..Default::default()
        };
        if quals.len() >= 2 {
            hints.filter_schema = Some(quals[quals.len() - 2].clone());
        }
        return CursorContext::new(ContextType::Column, Mode::Qualified).with_hints(hints);
    }

    let mut hints = ContextHints::default();
    if want_left_side {
        hints.left_side = left_side_before(tokens, offset);
    }
    CursorContext::new(ContextType::Column, mode).with_hints(hints)
}

/// `SET │` / `SET a = 1, │` are column positions; `SET a = │` completes a
/// value with the target column as the left side.
fn set_context(tokens: &[Token], offset: usize) -> CursorContext {
    let (qn, _) = dotted_name_before(tokens, offset);
    if qn.qualifiers().last().is_some() {
        return column_context(Mode::Set, tokens, offset, false);
    }
    match left_side_before(tokens, offset) {
        Some(ls) => {
            CursorContext::new(ContextType::Column, Mode::SetValue).with_hints(ContextHints {
                left_side: Some(ls),
                ..Default::default()
            })
        }
        None => CursorContext::new(ContextType::Column, Mode::Set),
    }
}

/// Matching open paren for the close paren at `close_idx`, backward.
fn matching_open(tokens: &[Token], close_idx: usize) -> Option<usize> {
    let mut bal = 0i32;
    for i in (0..=close_idx).rev() {
        match tokens[i].kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => {
                bal -= 1;
                if bal == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Inside `VALUES (…, │, …)`: 0-based comma count within the current
/// tuple, with the insert target pulled from the INSERT INTO path.
fn values_context(tokens: &[Token], offset: usize) -> CursorContext {
    let a = special::anchor_offset(tokens, offset);
    let mut bal = 0i32;
    let mut commas = 0usize;
    let mut open: Option<usize> = None;
    if let Some(mut i) = token_index_before(tokens, a) {
        loop {
            match tokens[i].kind {
                TokenKind::ParenClose => bal += 1,
                TokenKind::ParenOpen => {
                    bal -= 1;
                    if bal < 0 {
                        open = Some(i);
                        break;
                    }
                }
                TokenKind::Comma if bal == 0 => commas += 1,
                TokenKind::Keyword(Keyword::Values) if bal == 0 => break,
                _ => {}
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }

    let mut hints = ContextHints::default();
    if let Some(open) = open {
        hints.value_position = Some(commas);
        // verify VALUES introduces this tuple, skipping earlier tuples
        let mut j = prev_meaningful(tokens, open);
        loop {
            match j {
                Some(k) if tokens[k].is_keyword(Keyword::Values) => {
                    if let Some((schema, table)) = insert_target_before(tokens, k) {
                        hints.insert_schema = schema;
                        hints.insert_table = Some(table);
                    }
                    break;
                }
                Some(k) if matches!(tokens[k].kind, TokenKind::Comma) => {
                    j = prev_meaningful(tokens, k);
                }
                Some(k) if matches!(tokens[k].kind, TokenKind::ParenClose) => {
                    j = matching_open(tokens, k).and_then(|o| prev_meaningful(tokens, o));
                }
                _ => break,
            }
        }
    }
    CursorContext::new(ContextType::Column, Mode::Values).with_hints(hints)
}

/// The `INSERT INTO (db.)(schema.)table` path before index `idx`,
/// stepping over an optional column list.
fn insert_target_before(tokens: &[Token], idx: usize) -> Option<(Option<String>, String)> {
    let mut j = prev_meaningful(tokens, idx)?;
    if matches!(tokens[j].kind, TokenKind::ParenClose) {
        j = matching_open(tokens, j).and_then(|o| prev_meaningful(tokens, o))?;
    }
    let mut parts_rev = vec![tokens[j].name()?];
    loop {
        let Some(dot) = prev_meaningful(tokens, j) else {
            return None;
        };
        if !matches!(tokens[dot].kind, TokenKind::Dot) {
            if !tokens[dot].is_keyword(Keyword::Into) {
                return None;
            }
            break;
        }
        let part = prev_meaningful(tokens, dot)?;
        parts_rev.push(tokens[part].name()?);
        j = part;
    }
    parts_rev.reverse();
    let table = parts_rev.pop()?;
    let schema = parts_rev.pop();
    Some((schema, table))
}

/// Tables of an unparsed `( SELECT …` subquery enclosing the cursor, for
/// WHERE/HAVING descent. `None` when the cursor is not inside one, or the
/// paren is a function call / CTE body.
fn unparsed_subquery_tables(tokens: &[Token], offset: usize) -> Option<Vec<TableReference>> {
    let a = special::anchor_offset(tokens, offset);
    let mut bal = 0i32;
    let mut i = token_index_before(tokens, a)?;
    let open = loop {
        match tokens[i].kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => {
                bal -= 1;
                if bal < 0 {
                    break i;
                }
            }
            _ => {}
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    };

    // `( SELECT`: anything else is not a subquery
    let sel = (open + 1..tokens.len()).find(|&k| !tokens[k].kind.is_comment())?;
    if !tokens[sel].is_keyword(Keyword::Select) {
        return None;
    }
    // a preceding identifier makes it a function call; AS makes it a CTE
    if let Some(before) = prev_meaningful(tokens, open) {
        if tokens[before].kind.is_ident() || tokens[before].is_keyword(Keyword::As) {
            return None;
        }
    }

    // forward from the open paren: FROM/JOIN references at tuple depth
    let mut refs = Vec::new();
    let mut depth = 0i32;
    let mut expect = false;
    let mut k = open + 1;
    while k < tokens.len() {
        match &tokens[k].kind {
            TokenKind::ParenOpen => depth += 1,
            TokenKind::ParenClose => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            TokenKind::Keyword(Keyword::From | Keyword::Join) if depth == 0 => expect = true,
            TokenKind::Keyword(kw) if depth == 0 && kw.is_terminator() => expect = false,
            TokenKind::Comma if depth == 0 && !refs.is_empty() => expect = true,
            kind if expect && depth == 0 && kind.is_ident() => {
                let mut parts = vec![kind.name().unwrap_or_default()];
                while k + 2 < tokens.len()
                    && matches!(tokens[k + 1].kind, TokenKind::Dot)
                    && tokens[k + 2].kind.is_ident()
                {
                    parts.push(tokens[k + 2].name().unwrap_or_default());
                    k += 2;
                }
                let mut r = TableReference::default();
                r.name = parts.pop().unwrap_or_default();
                r.schema = parts.pop();
                r.database = parts.pop();
                // optional alias
                if let Some(nk) = (k + 1..tokens.len()).find(|&x| !tokens[x].kind.is_comment())
                    && tokens[nk].kind.is_ident()
                {
                    r.alias = tokens[nk].name();
                    k = nk;
                }
                refs.push(r);
                expect = false;
            }
            _ => {}
        }
        k += 1;
    }
    Some(refs)
}

/// Steps 4-11: prioritized token-based detection.
fn token_fallback(tokens: &[Token], offset: usize, chunk: &StatementChunk) -> CursorContext {
    // 5. alias disambiguation for dotted completion
    let (qn, _) = dotted_name_before(tokens, offset);
    if let Some(q) = qn.single_qualifier()
        && chunk.alias(q).is_some()
    {
        return CursorContext::new(ContextType::Column, Mode::Qualified).with_hints(ContextHints {
            table_ref: Some(q.to_string()),
            filter_table: Some(q.to_string()),
            omit_table: true,
            ..Default::default()
        });
    }

    let a = special::anchor_offset(tokens, offset);
    let Some(mut i) = token_index_before(tokens, a) else {
        return start_or_schema(&qn, true);
    };

    let mut bal = 0i32;
    loop {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => bal += 1,
            TokenKind::ParenOpen => bal -= 1,
            TokenKind::Semicolon => return start_or_schema(&qn, true),
            TokenKind::Keyword(kw) if bal <= 0 => match kw {
                Keyword::From => return table_context(TableFamily::From, tokens, offset),
                Keyword::Join => return table_context(TableFamily::Join, tokens, offset),
                kw if kw.is_join_qualifier() => {
                    return table_context(TableFamily::Join, tokens, offset);
                }
                Keyword::Into => {
                    let family = prev_meaningful(tokens, i)
                        .filter(|&p| tokens[p].is_keyword(Keyword::Merge))
                        .map(|_| TableFamily::Merge)
                        .unwrap_or(TableFamily::Into);
                    return table_context(family, tokens, offset);
                }
                Keyword::Update => return table_context(TableFamily::Update, tokens, offset),
                Keyword::Delete => return table_context(TableFamily::Delete, tokens, offset),
                Keyword::Using => return table_context(TableFamily::From, tokens, offset),
                Keyword::Merge => return table_context(TableFamily::Merge, tokens, offset),
                Keyword::Select => return column_context(Mode::Select, tokens, offset, false),
                Keyword::Where => return column_context(Mode::Where, tokens, offset, true),
                Keyword::Having => return column_context(Mode::Having, tokens, offset, true),
                Keyword::Group => return column_context(Mode::GroupBy, tokens, offset, false),
                Keyword::Order => return column_context(Mode::OrderBy, tokens, offset, false),
                Keyword::Set => return set_context(tokens, offset),
                Keyword::On => return column_context(Mode::On, tokens, offset, true),
                Keyword::Output => {
                    let mut ctx = column_context(Mode::Output, tokens, offset, false);
                    ctx.hints.is_output_clause = true;
                    return ctx;
                }
                Keyword::Values => return values_context(tokens, offset),
                Keyword::Use => return CursorContext::new(ContextType::Database, Mode::Use),
                Keyword::Go => return start_or_schema(&qn, true),
                Keyword::By
                | Keyword::And
                | Keyword::Or
                | Keyword::Case
                | Keyword::When
                | Keyword::Then
                | Keyword::Else
                | Keyword::Not
                | Keyword::Between
                | Keyword::Like
                | Keyword::In
                | Keyword::Is
                | Keyword::Null
                | Keyword::Exists
                | Keyword::Distinct
                | Keyword::All
                | Keyword::Top
                | Keyword::As
                | Keyword::Matched
                | Keyword::Recursive => {}
                _ => return start_or_schema(&qn, false),
            },
            _ => {}
        }
        if i == 0 {
            return start_or_schema(&qn, false);
        }
        i -= 1;
    }
}

/// Final fallback: a dangling `database.│` becomes schema completion;
/// otherwise keywords (statement-start or general).
fn start_or_schema(qn: &crate::cursor::QualifiedName, at_start: bool) -> CursorContext {
    if let Some(q) = qn.single_qualifier() {
        return CursorContext::new(ContextType::Schema, Mode::Database).with_hints(ContextHints {
            database: Some(q.to_string()),
            potential_database: Some(q.to_string()),
            omit_schema: true,
            ..Default::default()
        });
    }
    let mode = if at_start { Mode::Start } else { Mode::General };
    CursorContext::new(ContextType::Keyword, mode)
}

/// Attach the statement environment (scope, prefix, trigger) to a
/// classified context.
fn attach_env(
    mut ctx: CursorContext,
    outer: &StatementChunk,
    chunk: &StatementChunk,
    prefix: String,
    trigger: Option<char>,
) -> CursorContext {
    if !ctx.should_complete {
        return ctx;
    }
    ctx.prefix = prefix;
    ctx.trigger = trigger;
    ctx.tables_in_scope = chunk.tables.clone();
    ctx.ctes = outer.ctes.clone();
    ctx.ctes
        .extend(chunk.ctes.iter().map(|(k, v)| (k.clone(), v.clone())));
    ctx.temp_tables = outer.temp_tables.clone();
    ctx.temp_tables
        .extend(chunk.temp_tables.iter().map(|(k, v)| (k.clone(), v.clone())));
    for (alias, reference) in &chunk.aliases {
        ctx.aliases.insert(alias.clone(), reference.qualified_path());
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use crate::sql::{Dialect, tokenize};
    use rstest::rstest;

    /// Classify with the cursor marked by `│` in the SQL text.
    fn at(marked: &str) -> CursorContext {
        let offset = marked.find('│').expect("cursor marker");
        let sql = marked.replace('│', "");
        let stream = tokenize(&sql, Dialect::SqlServer);
        let chunks = parse(&sql, &stream, Dialect::SqlServer);
        let pos = stream.position_at(&sql, offset);
        classify(&sql, &stream, &chunks, pos)
    }

    #[test]
    fn string_and_comment_gate_suppresses() {
        let ctx = at("SELECT 'ab│c' FROM t");
        assert_eq!(ctx.kind, ContextType::Unknown);
        assert_eq!(ctx.mode, Mode::StringLit);
        assert!(!ctx.should_complete);

        let ctx = at("SELECT a -- not│e\nFROM t");
        assert_eq!(ctx.mode, Mode::Comment);
        assert!(!ctx.should_complete);
    }

    #[test]
    fn schema_qualified_from() {
        // S1
        let ctx = at("SELECT * FROM dbo.│");
        assert_eq!(ctx.kind, ContextType::Table);
        assert_eq!(ctx.mode, Mode::FromQualified);
        assert_eq!(ctx.hints.filter_schema.as_deref(), Some("dbo"));
        assert!(ctx.hints.omit_schema);
        assert_eq!(ctx.hints.potential_database.as_deref(), Some("dbo"));
    }

    #[test]
    fn qualified_column_in_on() {
        // S2
        let ctx = at("SELECT * FROM Employees e JOIN Departments d ON e.DepartmentID = d.│");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Qualified);
        assert_eq!(ctx.hints.table_ref.as_deref(), Some("d"));
        assert!(ctx.hints.omit_table);
    }

    #[test]
    fn join_table_context() {
        // S3 (classification half)
        let ctx = at("SELECT * FROM Orders o JOIN │");
        assert_eq!(ctx.kind, ContextType::Table);
        assert_eq!(ctx.mode, Mode::Join);
        assert_eq!(ctx.tables_in_scope.len(), 1);
    }

    #[test]
    fn cross_db_subquery_in_where() {
        // S4
        let ctx = at("SELECT * FROM Employees WHERE DeptID IN (SELECT ID FROM TEST.dbo.│)");
        assert_eq!(ctx.kind, ContextType::Table);
        assert_eq!(ctx.mode, Mode::FromCrossDbQualified);
        assert_eq!(ctx.hints.filter_database.as_deref(), Some("TEST"));
        assert_eq!(ctx.hints.filter_schema.as_deref(), Some("dbo"));
        assert!(ctx.hints.omit_schema);
    }

    #[test]
    fn values_position() {
        // S5
        let ctx = at("INSERT INTO T (a,b,c) VALUES (1, │, 3)");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Values);
        assert_eq!(ctx.hints.value_position, Some(1));
        assert_eq!(ctx.hints.insert_table.as_deref(), Some("T"));
    }

    #[test]
    fn values_position_is_whitespace_stable() {
        // invariant 7
        let a1 = at("INSERT INTO T (a,b,c) VALUES (1, │, 3)");
        let a2 = at("INSERT INTO T (a,b,c) VALUES (1,    │  , 3)");
        assert_eq!(a1.hints.value_position, a2.hints.value_position);
    }

    #[test]
    fn values_multi_row_resets_position() {
        let ctx = at("INSERT INTO T (a,b) VALUES (1, 2), (│)");
        assert_eq!(ctx.hints.value_position, Some(0));
        assert_eq!(ctx.hints.insert_table.as_deref(), Some("T"));
    }

    #[test]
    fn alias_shadows_schema() {
        // S6: alias "dbo" wins over schema completion
        let ctx = at("SELECT dbo.│ FROM Customers dbo");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Qualified);
        assert_eq!(ctx.hints.table_ref.as_deref(), Some("dbo"));
        assert!(ctx.hints.omit_table);
    }

    #[rstest]
    #[case("SELECT * FROM │", Mode::From)]
    #[case("SELECT * FROM Orders, │", Mode::From)]
    #[case("SELECT * FROM Orders o LEFT │", Mode::Join)]
    #[case("UPDATE │", Mode::Update)]
    #[case("MERGE INTO │", Mode::Merge)]
    #[case("INSERT INTO │", Mode::Into)]
    fn table_contexts(#[case] sql: &str, #[case] mode: Mode) {
        let ctx = at(sql);
        assert_eq!(ctx.kind, ContextType::Table, "{sql}");
        assert_eq!(ctx.mode, mode, "{sql}");
    }

    #[rstest]
    #[case("SELECT │", Mode::Select)]
    #[case("SELECT * FROM t WHERE │", Mode::Where)]
    #[case("SELECT * FROM t GROUP BY │", Mode::GroupBy)]
    #[case("SELECT * FROM t ORDER BY │", Mode::OrderBy)]
    #[case("SELECT * FROM t HAVING │", Mode::Having)]
    fn column_contexts(#[case] sql: &str, #[case] mode: Mode) {
        let ctx = at(sql);
        assert_eq!(ctx.kind, ContextType::Column, "{sql}");
        assert_eq!(ctx.mode, mode, "{sql}");
    }

    #[test]
    fn where_left_side_extraction() {
        let ctx = at("SELECT * FROM t WHERE Price > │");
        assert_eq!(ctx.mode, Mode::Where);
        let ls = ctx.hints.left_side.expect("left side");
        assert_eq!(ls.column, "Price");
        assert_eq!(ls.op, ">");
    }

    #[test]
    fn set_modes_pin_chained_assignments() {
        let ctx = at("UPDATE t SET │");
        assert_eq!(ctx.mode, Mode::Set);

        let ctx = at("UPDATE t SET a = │");
        assert_eq!(ctx.mode, Mode::SetValue);
        assert_eq!(ctx.hints.left_side.unwrap().column, "a");

        let ctx = at("UPDATE t SET a = 1, │");
        assert_eq!(ctx.mode, Mode::Set, "a chained assignment resets to column position");
    }

    #[test]
    fn use_and_dangling_database() {
        let ctx = at("USE │");
        assert_eq!(ctx.kind, ContextType::Database);
        assert_eq!(ctx.mode, Mode::Use);

        let ctx = at("Sales.│");
        assert_eq!(ctx.kind, ContextType::Schema);
        assert_eq!(ctx.hints.database.as_deref(), Some("Sales"));
    }

    #[test]
    fn keyword_start_and_general() {
        let ctx = at("│");
        assert_eq!(ctx.kind, ContextType::Keyword);
        assert_eq!(ctx.mode, Mode::Start);

        let ctx = at("SELECT 1 FROM t; │");
        assert_eq!(ctx.kind, ContextType::Keyword);
        assert_eq!(ctx.mode, Mode::Start);
    }

    #[test]
    fn subquery_select_column_context() {
        let ctx = at("SELECT * FROM t WHERE x IN (SELECT │)");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Select);
    }

    #[test]
    fn unparsed_subquery_tables_shadow_scope() {
        let ctx = at("SELECT * FROM Outer1 WHERE x IN (SELECT id FROM Inner1 i WHERE i.y = │)");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Where);
        assert_eq!(ctx.subquery_tables.len(), 1);
        assert_eq!(ctx.subquery_tables[0].name, "Inner1");
        assert_eq!(ctx.subquery_tables[0].alias.as_deref(), Some("i"));
    }

    #[test]
    fn alias_environment_attached() {
        let ctx = at("SELECT │ FROM Sales.dbo.Orders o JOIN Customers c ON o.CId = c.Id");
        assert_eq!(ctx.aliases.get("o").map(String::as_str), Some("Sales.dbo.Orders"));
        assert_eq!(ctx.aliases.get("c").map(String::as_str), Some("Customers"));
        assert_eq!(ctx.tables_in_scope.len(), 2);
    }

    #[test]
    fn prefix_and_trigger_attached() {
        let ctx = at("SELECT * FROM dbo.Ord│");
        assert_eq!(ctx.prefix, "Ord");
        assert_eq!(ctx.trigger, Some('.'));
        assert_eq!(ctx.mode, Mode::FromQualified);
    }

    #[test]
    fn exec_and_parameter_contexts() {
        let ctx = at("EXEC │");
        assert_eq!(ctx.kind, ContextType::Procedure);
        assert_eq!(ctx.mode, Mode::Exec);

        let ctx = at("EXEC dbo.MyProc │");
        assert_eq!(ctx.kind, ContextType::Parameter);
        assert_eq!(ctx.mode, Mode::ExecParams);
    }

    #[test]
    fn insert_columns_context() {
        let ctx = at("INSERT INTO dbo.Orders (Id, │) VALUES (1)");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::InsertColumns);
        assert_eq!(ctx.hints.insert_table.as_deref(), Some("Orders"));
        assert_eq!(ctx.hints.insert_schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn output_contexts() {
        let ctx = at("UPDATE t SET a = 1 OUTPUT INSERTED.│");
        assert_eq!(ctx.kind, ContextType::Column);
        assert_eq!(ctx.mode, Mode::Output);
        assert!(ctx.hints.is_output_clause);

        let ctx = at("UPDATE t SET a = 1 OUTPUT INSERTED.Id INTO │");
        assert_eq!(ctx.kind, ContextType::Table);
        assert_eq!(ctx.mode, Mode::Into);
        assert!(ctx.hints.is_output_clause);
    }

    #[test]
    fn merge_insert_columns_context() {
        let ctx = at(
            "MERGE INTO T USING (SELECT Id FROM S) s ON T.Id = s.Id \
             WHEN NOT MATCHED THEN INSERT (│",
        );
        assert_eq!(ctx.mode, Mode::MergeInsertColumns);
        assert!(ctx.hints.is_merge_insert);
    }

    #[test]
    fn out_of_range_position_suppresses() {
        let sql = "SELECT 1";
        let stream = tokenize(sql, Dialect::SqlServer);
        let chunks = parse(sql, &stream, Dialect::SqlServer);
        let ctx = classify(sql, &stream, &chunks, Position::new(40, 1));
        assert!(!ctx.should_complete);
    }

    #[test]
    fn from_clause_returns_table_for_comma_continuation() {
        // invariant 3: FROM, JOIN, or a depth-0 comma in FROM ⇒ table
        for sql in [
            "SELECT * FROM │",
            "SELECT * FROM a, │",
            "SELECT * FROM a JOIN │",
        ] {
            assert_eq!(at(sql).kind, ContextType::Table, "{sql}");
        }
    }
}
