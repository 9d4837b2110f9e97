// Front-chain circle packing for one sibling set.
//
// Circles are placed in the given order, each tangent to two circles of the
// current front chain, choosing the pair closest to the packing's weighted
// center. No randomness: the same input order always yields the same packing.
//
// Output: circle centers relative to the center of the smallest circle that
// encloses the whole packing, and that circle's radius.

use crate::geometry::Circle;

use super::enclose::enclose;

/// Pack `circles` in place (only x/y are written; radii are inputs) and
/// return the radius of the enclosing circle. Centers are translated so that
/// the enclosing circle is centered at the origin.
pub fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        // Already symmetric around the origin.
        return circles[0].r + circles[1].r;
    }

    place(circles, 1, 0, 2);

    // Front chain as a doubly linked ring over circle indices.
    let mut next = vec![usize::MAX; n];
    let mut prev = vec![usize::MAX; n];
    let (mut a, mut b) = (0usize, 1usize);
    let c = 2usize;
    next[a] = b;
    prev[b] = a;
    next[b] = c;
    prev[c] = b;
    next[c] = a;
    prev[a] = c;

    let mut i = 3;
    'pack: while i < n {
        place(circles, a, b, i);
        let c = i;

        // Walk the chain from both sides looking for the first circle that
        // intersects the new one.
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(&circles[j], &circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(&circles[k], &circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        // Success: insert c between a and b.
        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        // Pick the chain pair closest to the weighted center for the next circle.
        let mut best = a;
        let mut best_score = score(circles, a, next[a]);
        let mut cur = next[c];
        while cur != b {
            let s = score(circles, cur, next[cur]);
            if s < best_score {
                best = cur;
                best_score = s;
            }
            cur = next[cur];
        }
        a = best;
        b = next[a];
        i += 1;
    }

    // Enclose the front chain and recenter everything on it.
    let mut chain = vec![circles[b]];
    let mut cur = next[b];
    while cur != b {
        chain.push(circles[cur]);
        cur = next[cur];
    }
    let e = enclose(&chain).unwrap_or_default();
    for circle in circles.iter_mut() {
        circle.x -= e.x;
        circle.y -= e.y;
    }
    e.r
}

/// Place circle `c` tangent to circles `a` and `b`.
fn place(circles: &mut [Circle], b: usize, a: usize, c: usize) {
    let (ax, ay, ar) = (circles[a].x, circles[a].y, circles[a].r);
    let (bx, by, br) = (circles[b].x, circles[b].y, circles[b].r);
    let cr = circles[c].r;
    let dx = bx - ax;
    let dy = by - ay;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (ar + cr) * (ar + cr);
        let b2 = (br + cr) * (br + cr);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            circles[c].x = bx - x * dx - y * dy;
            circles[c].y = by - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            circles[c].x = ax + x * dx - y * dy;
            circles[c].y = ay + x * dy + y * dx;
        }
    } else {
        circles[c].x = ax + cr;
        circles[c].y = ay;
    }
}

fn intersects(a: &Circle, b: &Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn score(circles: &[Circle], a: usize, b: usize) -> f64 {
    let (ca, cb) = (&circles[a], &circles[b]);
    let ab = ca.r + cb.r;
    let dx = (ca.x * cb.r + cb.x * ca.r) / ab;
    let dy = (ca.y * cb.r + cb.y * ca.r) / ab;
    dx * dx + dy * dy
}
