//! Myers' O(ND) shortest edit script over arbitrary slices.
//!
//! The algorithm only needs an equality predicate, so the same routine serves
//! any token type. Common prefixes and suffixes are stripped before each
//! search. Problems with few edits run the forward search and backtrack
//! through its per-round frontiers; larger ones are split at a middle snake
//! and solved recursively, which keeps memory linear in the input.

/// Largest edit distance searched with the backtracking trace. The trace
/// holds about `MAX_TRACED_EDITS²` entries.
const MAX_TRACED_EDITS: usize = 512;

/// One step of an edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTag {
    /// Keep one element of each side
    Equal,
    /// Take one element from the new side
    Insert,
    /// Drop one element of the old side
    Delete,
}

/// Compute a shortest edit script turning `old` into `new`.
///
/// Every `Equal` and `Delete` consumes one element of `old`, every `Equal` and
/// `Insert` one element of `new`, in order.
pub fn diff_by<T, F>(old: &[T], new: &[T], mut eq: F) -> Vec<EditTag>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut tags = Vec::with_capacity(old.len().max(new.len()));
    conquer(old, new, &mut eq, MAX_TRACED_EDITS, &mut tags);
    tags
}

/// Convenience wrapper comparing with `PartialEq`
pub fn diff<T: PartialEq>(old: &[T], new: &[T]) -> Vec<EditTag> {
    diff_by(old, new, |a, b| a == b)
}

fn conquer<T, F>(old: &[T], new: &[T], eq: &mut F, trace_limit: usize, tags: &mut Vec<EditTag>)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut prefix = 0;
    while prefix < old.len() && prefix < new.len() && eq(&old[prefix], &new[prefix]) {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && eq(&old[old.len() - 1 - suffix], &new[new.len() - 1 - suffix])
    {
        suffix += 1;
    }

    tags.extend(std::iter::repeat(EditTag::Equal).take(prefix));
    let old = &old[prefix..old.len() - suffix];
    let new = &new[prefix..new.len() - suffix];

    if old.is_empty() {
        tags.extend(std::iter::repeat(EditTag::Insert).take(new.len()));
    } else if new.is_empty() {
        tags.extend(std::iter::repeat(EditTag::Delete).take(old.len()));
    } else if let Some(script) = traced_edit(old, new, eq, trace_limit) {
        tags.extend(script);
    } else if let Some((x, y)) = middle_snake(old, new, eq) {
        conquer(&old[..x], &new[..y], eq, trace_limit, tags);
        conquer(&old[x..], &new[y..], eq, trace_limit, tags);
    } else {
        tags.extend(std::iter::repeat(EditTag::Delete).take(old.len()));
        tags.extend(std::iter::repeat(EditTag::Insert).take(new.len()));
    }

    tags.extend(std::iter::repeat(EditTag::Equal).take(suffix));
}

/// Forward search that keeps one frontier snapshot per round for
/// backtracking. Gives up with `None` once more than `limit` edits are needed.
fn traced_edit<T, F>(old: &[T], new: &[T], eq: &mut F, limit: usize) -> Option<Vec<EditTag>>
where
    F: FnMut(&T, &T) -> bool,
{
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    let offset = max;
    // Furthest x reached on each diagonal k = x - y, indexed by k + offset
    let mut frontier = vec![0isize; (2 * max + 2) as usize];
    // rounds[d][k + d] is the frontier after d edits, for k in -d..=d
    let mut rounds: Vec<Vec<isize>> = Vec::new();

    for d in 0..=max.min(limit as isize) {
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && frontier[idx - 1] < frontier[idx + 1]) {
                frontier[idx + 1]
            } else {
                frontier[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && eq(&old[x as usize], &new[y as usize]) {
                x += 1;
                y += 1;
            }
            frontier[idx] = x;

            if x >= n && y >= m {
                rounds.push(frontier[(offset - d) as usize..=(offset + d) as usize].to_vec());
                return Some(backtrack(&rounds, n, m));
            }
            k += 2;
        }
        rounds.push(frontier[(offset - d) as usize..=(offset + d) as usize].to_vec());
    }

    None
}

fn backtrack(rounds: &[Vec<isize>], n: isize, m: isize) -> Vec<EditTag> {
    let mut tags = Vec::new();
    let (mut x, mut y) = (n, m);

    for d in (1..rounds.len() as isize).rev() {
        let prev = &rounds[(d - 1) as usize];
        let at = |k: isize| prev[(k + d - 1) as usize];

        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            tags.push(EditTag::Equal);
            x -= 1;
            y -= 1;
        }
        if x == prev_x {
            tags.push(EditTag::Insert);
        } else {
            tags.push(EditTag::Delete);
        }
        x = prev_x;
        y = prev_y;
    }

    // Leading snake of round zero
    debug_assert_eq!(x, y);
    tags.extend(std::iter::repeat(EditTag::Equal).take(x as usize));

    tags.reverse();
    tags
}

/// Find a point on an optimal edit path roughly halfway through it, running
/// the forward search from the start and the reverse search from the end
/// until they overlap. Both frontiers are linear in the input.
///
/// Expects non-empty sides with no common prefix or suffix.
fn middle_snake<T, F>(old: &[T], new: &[T], eq: &mut F) -> Option<(usize, usize)>
where
    F: FnMut(&T, &T) -> bool,
{
    let n = old.len() as isize;
    let m = new.len() as isize;
    let delta = n - m;
    let odd = delta & 1 == 1;
    let d_max = (n + m + 1) / 2 + 1;
    let at = |k: isize| (k + d_max) as usize;

    // forward[k]: furthest x on diagonal k from the start. backward[k]: the
    // same from the end, with x and y counted from the back of each side.
    let mut forward = vec![0isize; (2 * d_max + 1) as usize];
    let mut backward = vec![0isize; (2 * d_max + 1) as usize];

    for d in 0..d_max {
        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && forward[at(k - 1)] < forward[at(k + 1)]) {
                forward[at(k + 1)]
            } else {
                forward[at(k - 1)] + 1
            };
            let (x0, y0) = (x, x - k);
            let mut y = y0;
            while x < n && y < m && eq(&old[x as usize], &new[y as usize]) {
                x += 1;
                y += 1;
            }
            forward[at(k)] = x;

            // Reverse diagonal delta - k meets forward diagonal k
            if odd && (k - delta).abs() < d && x + backward[at(delta - k)] >= n {
                return Some((x0 as usize, y0 as usize));
            }
            k -= 2;
        }

        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && backward[at(k - 1)] < backward[at(k + 1)]) {
                backward[at(k + 1)]
            } else {
                backward[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n
                && y < m
                && eq(&old[(n - x - 1) as usize], &new[(m - y - 1) as usize])
            {
                x += 1;
                y += 1;
            }
            backward[at(k)] = x;

            if !odd && (k - delta).abs() <= d && x + forward[at(delta - k)] >= n {
                return Some(((n - x) as usize, (m - y) as usize));
            }
            k -= 2;
        }
    }

    None
}
