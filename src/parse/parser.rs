//! Clause-region and scope extraction for one statement.
//!
//! A top-down recognizer keyed on the leading keyword walks tokens at
//! paren-depth zero, recording where each clause begins and ends, pulling
//! table references (with aliases) out of FROM/JOIN/INTO/UPDATE/USING,
//! collecting CTE and temp-table definitions, and descending into
//! FROM-subqueries. Malformed input never raises: unrecognized forms
//! produce a chunk without clause positions and the classifier falls back
//! to token-based detection.

use crate::parse::chunk::{ParseDiagnostic, StatementChunk, StatementKind};
use crate::parse::clause::{Clause, ClauseRegion};
use crate::parse::splitter::{Segment, split_statements};
use crate::parse::table_ref::{CteDefinition, TableReference, TableRefKind, TempTable};
use crate::sql::{Dialect, Keyword, Token, TokenKind, TokenStream};
use std::ops::Range;

/// Parse a buffer into statement chunks.
pub fn parse(text: &str, stream: &TokenStream, dialect: Dialect) -> Vec<StatementChunk> {
    split_statements(stream.tokens(), dialect, text.len())
        .into_iter()
        .map(|seg| parse_segment(text, stream, seg))
        .collect()
}

/// Index of the matching close paren for the open paren at `open_idx`,
/// searching up to `end` (exclusive).
fn matching_paren(tokens: &[Token], open_idx: usize, end: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate().take(end).skip(open_idx) {
        match t.kind {
            TokenKind::ParenOpen => depth += 1,
            TokenKind::ParenClose => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Next non-comment token index at or after `idx`, below `end`.
fn next_meaningful(tokens: &[Token], idx: usize, end: usize) -> Option<usize> {
    (idx..end).find(|&i| !tokens[i].kind.is_comment())
}

/// Closes and opens clause regions as the walk advances.
struct RegionTracker {
    open: Option<(Clause, usize)>,
}

impl RegionTracker {
    fn new() -> Self {
        Self { open: None }
    }

    fn current(&self) -> Option<Clause> {
        self.open.map(|(c, _)| c)
    }

    fn close(&mut self, at: usize, chunk: &mut StatementChunk, text: &str, stream: &TokenStream) {
        if let Some((clause, start)) = self.open.take() {
            let start_pos = stream.position_at(text, start);
            let end_pos = stream.position_at(text, at);
            chunk
                .clauses
                .entry(clause)
                .or_default()
                .push(ClauseRegion::new(start_pos, end_pos));
        }
    }

    fn open(
        &mut self,
        clause: Clause,
        close_at: usize,
        start: usize,
        chunk: &mut StatementChunk,
        text: &str,
        stream: &TokenStream,
    ) {
        self.close(close_at, chunk, text, stream);
        self.open = Some((clause, start));
    }
}

fn statement_kind(tokens: &[Token], range: &Range<usize>) -> StatementKind {
    let mut i = range.start;
    while i < range.end {
        let t = &tokens[i];
        if t.kind.is_comment() {
            i += 1;
            continue;
        }
        // WITH prologue: the real statement form follows the CTE list
        if t.is_keyword(Keyword::With) {
            let mut depth = 0i32;
            for t in &tokens[i + 1..range.end] {
                match t.kind {
                    TokenKind::ParenOpen => depth += 1,
                    TokenKind::ParenClose => depth -= 1,
                    TokenKind::Keyword(kw) if depth == 0 => match kw {
                        Keyword::Select => return StatementKind::Select,
                        Keyword::Insert => return StatementKind::Insert,
                        Keyword::Update => return StatementKind::Update,
                        Keyword::Delete => return StatementKind::Delete,
                        Keyword::Merge => return StatementKind::Merge,
                        _ => {}
                    },
                    _ => {}
                }
            }
            return StatementKind::Select;
        }
        return match t.kind {
            TokenKind::Keyword(Keyword::Select) => StatementKind::Select,
            TokenKind::Keyword(Keyword::Insert) => StatementKind::Insert,
            TokenKind::Keyword(Keyword::Update) => StatementKind::Update,
            TokenKind::Keyword(Keyword::Delete) => StatementKind::Delete,
            TokenKind::Keyword(Keyword::Merge) => StatementKind::Merge,
            TokenKind::Keyword(Keyword::Exec | Keyword::Execute) => StatementKind::Exec,
            TokenKind::Keyword(Keyword::Use) => StatementKind::Use,
            TokenKind::Keyword(Keyword::Create) => StatementKind::Create,
            _ => StatementKind::Other,
        };
    }
    StatementKind::Other
}

fn parse_segment(text: &str, stream: &TokenStream, seg: Segment) -> StatementChunk {
    let tokens = stream.tokens();
    let mut chunk = StatementChunk {
        range: seg.range.clone(),
        token_range: seg.token_range.clone(),
        kind: statement_kind(tokens, &seg.token_range),
        ..Default::default()
    };

    for d in stream.diagnostics() {
        if let Some(offset) = stream.offset_at(text, d.position())
            && offset >= chunk.range.start
            && offset < chunk.range.end
        {
            chunk.diagnostics.push(ParseDiagnostic::OpenDelimiter {
                at: d.position(),
            });
        }
    }

    let end = seg.token_range.end;
    let mut i = seg.token_range.start;

    // WITH prologue
    if let Some(w) = next_meaningful(tokens, i, end)
        && tokens[w].is_keyword(Keyword::With)
    {
        i = parse_ctes(tokens, w + 1, end, &mut chunk);
    }

    let mut tracker = RegionTracker::new();
    let mut depth = 0i32;
    let mut expect_table = false;
    let mut select_kw_idx: Option<usize> = None;
    let mut insert_columns_done = false;

    while i < end {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenOpen => {
                // INSERT column list: INSERT INTO t (a, b, c) …
                if chunk.kind == StatementKind::Insert
                    && tracker.current() == Some(Clause::Into)
                    && !insert_columns_done
                {
                    insert_columns_done = true;
                    let close = matching_paren(tokens, i, end);
                    let region_end = close.map(|c| tokens[c].start).unwrap_or(chunk.range.end);
                    tracker.close(t.start, &mut chunk, text, stream);
                    chunk
                        .clauses
                        .entry(Clause::InsertColumns)
                        .or_default()
                        .push(ClauseRegion::new(
                            stream.position_at(text, t.end),
                            stream.position_at(text, region_end),
                        ));
                    i = close.map(|c| c + 1).unwrap_or(end);
                    continue;
                }

                // MERGE … WHEN NOT MATCHED THEN INSERT (a, b) …
                if chunk.kind == StatementKind::Merge && merge_insert_precedes(tokens, i) {
                    let close = matching_paren(tokens, i, end);
                    let region_end = close.map(|c| tokens[c].start).unwrap_or(chunk.range.end);
                    tracker.close(t.start, &mut chunk, text, stream);
                    chunk
                        .clauses
                        .entry(Clause::MergeInsertColumns)
                        .or_default()
                        .push(ClauseRegion::new(
                            stream.position_at(text, t.end),
                            stream.position_at(text, region_end),
                        ));
                    i = close.map(|c| c + 1).unwrap_or(end);
                    continue;
                }

                // FROM/JOIN/USING subquery: ( SELECT … ) alias
                if expect_table
                    && let Some(n) = next_meaningful(tokens, i + 1, end)
                    && tokens[n].is_keyword(Keyword::Select)
                {
                    let close = matching_paren(tokens, i, end);
                    let body_end = close.unwrap_or(end);
                    let sub = parse_segment(
                        text,
                        stream,
                        Segment {
                            range: tokens[i].end..tokens
                                .get(body_end)
                                .map(|t| t.start)
                                .unwrap_or(chunk.range.end),
                            token_range: i + 1..body_end,
                        },
                    );
                    let (columns, wildcard_sources) =
                        projected_columns(&tokens[i + 1..body_end]);
                    let after = close.map(|c| c + 1).unwrap_or(end);
                    let (alias, next_i) = parse_alias(tokens, after, end);
                    let mut reference = TableReference {
                        name: alias.clone().unwrap_or_default(),
                        alias,
                        kind: TableRefKind::Subquery,
                        columns,
                        wildcard_sources,
                        ..Default::default()
                    };
                    if reference.name.is_empty() {
                        reference.name = "(subquery)".to_string();
                    }
                    register_reference(&mut chunk, reference);
                    chunk.subqueries.push(sub);
                    i = next_i;
                    expect_table = tracker.current() == Some(Clause::From)
                        && next_meaningful(tokens, i, end)
                            .is_some_and(|n| matches!(tokens[n].kind, TokenKind::Comma));
                    continue;
                }

                depth += 1;
                i += 1;
                continue;
            }
            TokenKind::ParenClose => {
                depth -= 1;
                i += 1;
                continue;
            }
            TokenKind::Comma if depth == 0 => {
                if tracker.current() == Some(Clause::From) {
                    expect_table = true;
                }
                i += 1;
                continue;
            }
            TokenKind::Semicolon => {
                tracker.close(t.start, &mut chunk, text, stream);
                expect_table = false;
                i += 1;
                continue;
            }
            TokenKind::Keyword(kw) if depth == 0 => {
                match kw {
                    Keyword::Select => {
                        tracker.open(Clause::Select, t.start, t.end, &mut chunk, text, stream);
                        select_kw_idx = Some(i);
                        expect_table = false;
                    }
                    Keyword::From => {
                        tracker.open(Clause::From, t.start, t.end, &mut chunk, text, stream);
                        expect_table = true;
                    }
                    Keyword::Join => {
                        tracker.open(Clause::Join, t.start, t.end, &mut chunk, text, stream);
                        expect_table = true;
                    }
                    Keyword::On => {
                        tracker.open(Clause::On, t.start, t.end, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Where => {
                        tracker.open(Clause::Where, t.start, t.end, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Having => {
                        tracker.open(Clause::Having, t.start, t.end, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Group | Keyword::Order => {
                        let clause = if *kw == Keyword::Group {
                            Clause::GroupBy
                        } else {
                            Clause::OrderBy
                        };
                        if let Some(by) = next_meaningful(tokens, i + 1, end)
                            .filter(|&n| tokens[n].is_keyword(Keyword::By))
                        {
                            tracker.open(
                                clause,
                                t.start,
                                tokens[by].end,
                                &mut chunk,
                                text,
                                stream,
                            );
                            expect_table = false;
                            i = by + 1;
                            continue;
                        }
                    }
                    Keyword::Set if chunk.kind == StatementKind::Update => {
                        tracker.open(Clause::Set, t.start, t.end, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Values => {
                        tracker.open(Clause::Values, t.start, t.end, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Into => {
                        tracker.open(Clause::Into, t.start, t.end, &mut chunk, text, stream);
                        // SELECT … INTO #tmp captures the projection
                        if chunk.kind == StatementKind::Select
                            && let Some(sel) = select_kw_idx
                            && let Some(n) = next_meaningful(tokens, i + 1, end)
                            && tokens[n]
                                .name()
                                .is_some_and(|name| name.starts_with('#'))
                        {
                            let name = tokens[n].name().unwrap_or_default();
                            let (columns, _) = projected_columns(&tokens[sel..i]);
                            chunk.temp_tables.insert(
                                name.to_lowercase(),
                                TempTable {
                                    is_global: name.starts_with("##"),
                                    name,
                                    columns,
                                },
                            );
                        }
                        expect_table = true;
                    }
                    Keyword::Using if chunk.kind == StatementKind::Merge => {
                        tracker.open(Clause::Using, t.start, t.end, &mut chunk, text, stream);
                        expect_table = true;
                    }
                    Keyword::Update | Keyword::Delete => {
                        expect_table = *kw == Keyword::Update;
                    }
                    Keyword::Union | Keyword::Except | Keyword::Intersect | Keyword::Go => {
                        tracker.close(t.start, &mut chunk, text, stream);
                        expect_table = false;
                    }
                    Keyword::Create => {
                        i = parse_create_table(tokens, i, end, &mut chunk);
                        continue;
                    }
                    Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
                    | Keyword::Outer
                    | Keyword::Merge
                    | Keyword::Insert
                    | Keyword::When
                    | Keyword::Matched
                    | Keyword::Not
                    | Keyword::Then
                    | Keyword::Distinct
                    | Keyword::All
                    | Keyword::Top => {}
                    _ => {
                        expect_table = false;
                    }
                }
                i += 1;
                continue;
            }
            kind if expect_table && depth == 0 && kind.is_ident() => {
                if let Some((reference, next_i)) = parse_table_ref(tokens, i, end, &chunk) {
                    register_reference(&mut chunk, reference);
                    i = next_i;
                    expect_table = tracker.current() == Some(Clause::From)
                        && next_meaningful(tokens, i, end)
                            .is_some_and(|n| matches!(tokens[n].kind, TokenKind::Comma));
                    continue;
                }
                expect_table = false;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
    }

    tracker.close(chunk.range.end, &mut chunk, text, stream);
    if depth != 0 {
        chunk
            .diagnostics
            .push(ParseDiagnostic::UnbalancedParens { open: depth });
    }
    chunk
}

/// True when the open paren at `idx` follows `THEN INSERT` (the MERGE
/// not-matched insert column list). Walks backward tracking paren depth
/// so a `USING (SELECT …)` group earlier in the statement cannot confuse
/// the pattern.
fn merge_insert_precedes(tokens: &[Token], idx: usize) -> bool {
    let mut i = idx;
    let mut seen_insert = false;
    let mut depth = 0i32;
    while i > 0 {
        i -= 1;
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenClose => depth += 1,
            TokenKind::ParenOpen => depth -= 1,
            _ if depth > 0 => {}
            TokenKind::Keyword(Keyword::Insert) if !seen_insert => seen_insert = true,
            TokenKind::Keyword(Keyword::Then) if seen_insert => return true,
            kind if kind.is_comment() => {}
            _ => return false,
        }
    }
    false
}

/// Register a table reference and its alias binding on the chunk.
fn register_reference(chunk: &mut StatementChunk, reference: TableReference) {
    if let Some(alias) = &reference.alias {
        chunk
            .aliases
            .insert(alias.to_lowercase(), reference.clone());
    }
    chunk.tables.push(reference);
}

/// Parse `(db.)?(schema.)?name [AS] alias`, or `name(…) alias` for a TVF.
/// Marks CTE and temp-table references by name.
fn parse_table_ref(
    tokens: &[Token],
    start: usize,
    end: usize,
    chunk: &StatementChunk,
) -> Option<(TableReference, usize)> {
    let mut parts: Vec<String> = vec![tokens[start].name()?];
    let mut i = start + 1;
    while i + 1 < end
        && matches!(tokens[i].kind, TokenKind::Dot)
        && tokens[i + 1].kind.is_ident()
    {
        parts.push(tokens[i + 1].name().unwrap_or_default());
        i += 2;
    }

    let mut reference = TableReference::default();
    reference.name = parts.pop().unwrap_or_default();
    reference.schema = parts.pop();
    reference.database = parts.pop();

    // TVF: name(…) : skip the argument list, then look for an alias
    if i < end && matches!(tokens[i].kind, TokenKind::ParenOpen) {
        reference.kind = TableRefKind::Tvf;
        i = matching_paren(tokens, i, end).map(|c| c + 1).unwrap_or(end);
    } else if let Some(cte) = chunk.cte(&reference.name) {
        reference.kind = TableRefKind::Cte;
        reference.columns = cte.columns.clone();
        reference.wildcard_sources = cte.wildcard_sources.clone();
    } else if reference.name.starts_with('#') {
        reference.kind = TableRefKind::TempTable {
            global: reference.name.starts_with("##"),
        };
        if let Some(tmp) = chunk.temp_tables.get(&reference.name.to_lowercase()) {
            reference.columns = tmp.columns.clone();
        }
    }

    let (alias, next_i) = parse_alias(tokens, i, end);
    reference.alias = alias;
    Some((reference, next_i))
}

/// Optional `[AS] alias` after a table reference.
fn parse_alias(tokens: &[Token], start: usize, end: usize) -> (Option<String>, usize) {
    let Some(i) = next_meaningful(tokens, start, end) else {
        return (None, start);
    };
    match &tokens[i].kind {
        TokenKind::Keyword(Keyword::As) => {
            if let Some(n) = next_meaningful(tokens, i + 1, end)
                && tokens[n].kind.is_ident()
            {
                return (tokens[n].name(), n + 1);
            }
            (None, i + 1)
        }
        kind if kind.is_ident() => (tokens[i].name(), i + 1),
        _ => (None, start),
    }
}

/// Parse the CTE list after `WITH`, returning the index where the main
/// statement resumes.
fn parse_ctes(tokens: &[Token], start: usize, end: usize, chunk: &mut StatementChunk) -> usize {
    let mut i = start;
    if let Some(n) = next_meaningful(tokens, i, end)
        && tokens[n].is_keyword(Keyword::Recursive)
    {
        i = n + 1;
    }

    loop {
        let Some(name_idx) = next_meaningful(tokens, i, end) else {
            return end;
        };
        let Some(name) = tokens[name_idx].name() else {
            return name_idx;
        };
        i = name_idx + 1;

        // Optional explicit column list: name (a, b)
        let mut explicit: Vec<String> = Vec::new();
        if let Some(p) = next_meaningful(tokens, i, end)
            && matches!(tokens[p].kind, TokenKind::ParenOpen)
        {
            // only a column list when AS follows the close paren
            if let Some(close) = matching_paren(tokens, p, end)
                && next_meaningful(tokens, close + 1, end)
                    .is_some_and(|n| tokens[n].is_keyword(Keyword::As))
            {
                let mut depth = 0i32;
                for t in &tokens[p..=close] {
                    match &t.kind {
                        TokenKind::ParenOpen => depth += 1,
                        TokenKind::ParenClose => depth -= 1,
                        kind if depth == 1 && kind.is_ident() => {
                            explicit.push(kind.name().unwrap_or_default());
                        }
                        _ => {}
                    }
                }
                i = close + 1;
            }
        }

        // AS ( body )
        let Some(as_idx) = next_meaningful(tokens, i, end)
            .filter(|&n| tokens[n].is_keyword(Keyword::As))
        else {
            return name_idx;
        };
        let Some(open) = next_meaningful(tokens, as_idx + 1, end)
            .filter(|&n| matches!(tokens[n].kind, TokenKind::ParenOpen))
        else {
            return name_idx;
        };
        let close = matching_paren(tokens, open, end).unwrap_or(end);
        let body = open + 1..close;
        let (projected, mut wildcard_sources) = projected_columns(&tokens[body.clone()]);
        // a recursive CTE referencing itself must not expand through itself
        wildcard_sources.retain(|s| !s.eq_ignore_ascii_case(&name));
        chunk.ctes.insert(
            name.to_lowercase(),
            CteDefinition {
                name,
                columns: if explicit.is_empty() { projected } else { explicit },
                body,
                wildcard_sources,
            },
        );
        i = (close + 1).min(end);

        match next_meaningful(tokens, i, end) {
            Some(n) if matches!(tokens[n].kind, TokenKind::Comma) => i = n + 1,
            _ => return i,
        }
    }
}

/// Collect `CREATE TABLE #name (col …, col …)` temp definitions; other
/// CREATE forms are skipped. Returns the resume index.
fn parse_create_table(
    tokens: &[Token],
    create_idx: usize,
    end: usize,
    chunk: &mut StatementChunk,
) -> usize {
    let Some(table_kw) = next_meaningful(tokens, create_idx + 1, end)
        .filter(|&n| tokens[n].is_keyword(Keyword::Table))
    else {
        return create_idx + 1;
    };
    let Some(name_idx) = next_meaningful(tokens, table_kw + 1, end)
        .filter(|&n| tokens[n].kind.is_ident())
    else {
        return table_kw + 1;
    };
    let name = tokens[name_idx].name().unwrap_or_default();
    if !name.starts_with('#') {
        return name_idx + 1;
    }

    let mut columns = Vec::new();
    let mut resume = name_idx + 1;
    if let Some(open) = next_meaningful(tokens, name_idx + 1, end)
        .filter(|&n| matches!(tokens[n].kind, TokenKind::ParenOpen))
    {
        let close = matching_paren(tokens, open, end).unwrap_or(end);
        let mut depth = 0i32;
        let mut expect_column = true;
        for t in &tokens[open..close.min(end)] {
            match &t.kind {
                TokenKind::ParenOpen => depth += 1,
                TokenKind::ParenClose => depth -= 1,
                TokenKind::Comma if depth == 1 => expect_column = true,
                kind if depth == 1 && expect_column && kind.is_ident() => {
                    columns.push(kind.name().unwrap_or_default());
                    expect_column = false;
                }
                _ if depth == 1 => expect_column = false,
                _ => {}
            }
        }
        resume = (close + 1).min(end);
    }

    chunk.temp_tables.insert(
        name.to_lowercase(),
        TempTable {
            is_global: name.starts_with("##"),
            name,
            columns,
        },
    );
    resume
}

/// Output column names of a SELECT list, plus the FROM tables a `*`
/// projection expands over. Items whose name cannot be resolved
/// (expressions without aliases) are omitted.
pub fn projected_columns(tokens: &[Token]) -> (Vec<String>, Vec<String>) {
    let mut columns = Vec::new();
    let mut has_star = false;

    let Some(select) = tokens
        .iter()
        .position(|t| t.is_keyword(Keyword::Select))
    else {
        return (columns, Vec::new());
    };

    let mut item: Vec<&Token> = Vec::new();
    let mut depth = 0i32;
    let mut end_idx = tokens.len();
    for (i, t) in tokens.iter().enumerate().skip(select + 1) {
        match &t.kind {
            TokenKind::ParenOpen => {
                depth += 1;
                item.push(t);
            }
            TokenKind::ParenClose => {
                depth -= 1;
                item.push(t);
            }
            TokenKind::Comma if depth == 0 => {
                resolve_item(&item, &mut columns, &mut has_star);
                item.clear();
            }
            TokenKind::Keyword(Keyword::From | Keyword::Into) if depth == 0 => {
                end_idx = i;
                break;
            }
            TokenKind::Keyword(Keyword::Distinct | Keyword::All | Keyword::Top)
                if item.is_empty() => {}
            kind if kind.is_comment() => {}
            _ => item.push(t),
        }
    }
    resolve_item(&item, &mut columns, &mut has_star);

    let wildcard_sources = if has_star {
        from_table_names(&tokens[end_idx.min(tokens.len())..])
    } else {
        Vec::new()
    };
    (columns, wildcard_sources)
}

/// Determine the output name of one SELECT item.
fn resolve_item(item: &[&Token], columns: &mut Vec<String>, has_star: &mut bool) {
    if item.is_empty() {
        return;
    }
    if item
        .iter()
        .any(|t| matches!(&t.kind, TokenKind::Operator(op) if op == "*"))
    {
        *has_star = true;
        return;
    }

    let last = item[item.len() - 1];
    let second_last = item.len().checked_sub(2).map(|i| item[i]);

    // `expr AS alias` or implicit `expr alias`
    if last.kind.is_ident() {
        match second_last.map(|t| &t.kind) {
            Some(TokenKind::Keyword(Keyword::As)) => {
                columns.extend(last.name());
                return;
            }
            Some(TokenKind::Dot) => {
                // qualified column: take the column part
                columns.extend(last.name());
                return;
            }
            Some(kind) if kind.is_ident() || matches!(kind, TokenKind::ParenClose) => {
                columns.extend(last.name());
                return;
            }
            None => {
                columns.extend(last.name());
                return;
            }
            _ => {}
        }
    }
}

/// Bare table names after FROM/JOIN in a token slice (depth 0 within the
/// slice); used for `*` expansion of CTE/subquery projections.
fn from_table_names(tokens: &[Token]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut expect = false;
    let mut i = 0;
    while i < tokens.len() {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::ParenOpen => depth += 1,
            TokenKind::ParenClose => depth -= 1,
            TokenKind::Keyword(Keyword::From | Keyword::Join) if depth == 0 => expect = true,
            TokenKind::Comma if depth == 0 => expect = expect || !names.is_empty(),
            TokenKind::Keyword(kw) if depth == 0 && kw.is_terminator() => expect = false,
            kind if expect && depth == 0 && kind.is_ident() => {
                // swallow a qualified path, keep the last part
                let mut name = kind.name().unwrap_or_default();
                while i + 2 < tokens.len()
                    && matches!(tokens[i + 1].kind, TokenKind::Dot)
                    && tokens[i + 2].kind.is_ident()
                {
                    name = tokens[i + 2].name().unwrap_or_default();
                    i += 2;
                }
                names.push(name);
                expect = false;
            }
            _ => {}
        }
        i += 1;
    }
    names
}
