// Minimum enclosing circle of a set of circles.
//
// Incremental Welzl-style construction over a basis of at most three circles.
// Circles are visited in the given order (no shuffling) so the result is
// deterministic; sibling sets are small, so the quadratic worst case is fine.

use log::warn;

use crate::geometry::Circle;

/// Smallest circle enclosing every circle in `circles`.
/// Returns `None` for an empty slice.
pub fn enclose(circles: &[Circle]) -> Option<Circle> {
    let mut basis: Vec<Circle> = Vec::with_capacity(3);
    let mut enclosing: Option<Circle> = None;
    let mut i = 0;

    while i < circles.len() {
        let p = circles[i];
        match enclosing {
            Some(e) if encloses_weak(&e, &p) => i += 1,
            _ => {
                basis = match extend_basis(&basis, &p) {
                    Some(b) => b,
                    None => {
                        warn!("enclose: no basis found, falling back to bounding circle");
                        return Some(bounding_fallback(circles));
                    }
                };
                enclosing = Some(enclose_basis(&basis));
                i = 0;
            }
        }
    }

    enclosing
}

fn extend_basis(basis: &[Circle], p: &Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![*p]);
    }

    // If we get here then basis must have at least one element.
    for b in basis {
        if encloses_not(p, b) && encloses_weak_all(&enclose_basis2(b, p), basis) {
            return Some(vec![*b, *p]);
        }
    }

    // If we get here then basis must have at least two elements.
    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (bi, bj) = (&basis[i], &basis[j]);
            if encloses_not(&enclose_basis2(bi, bj), p)
                && encloses_not(&enclose_basis2(bi, p), bj)
                && encloses_not(&enclose_basis2(bj, p), bi)
                && encloses_weak_all(&enclose_basis3(bi, bj, p), basis)
            {
                return Some(vec![*bi, *bj, *p]);
            }
        }
    }

    None
}

fn encloses_not(a: &Circle, b: &Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: &Circle, b: &Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: &Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_basis2(a, b),
        [a, b, c] => enclose_basis3(a, b, c),
        _ => bounding_fallback(basis),
    }
}

fn enclose_basis2(a: &Circle, b: &Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let x21 = x2 - x1;
    let y21 = y2 - y1;
    let r21 = r2 - r1;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l <= f64::EPSILON {
        // Concentric: the larger one encloses both.
        return if r1 >= r2 { *a } else { *b };
    }
    Circle::new(
        (x1 + x2 + x21 / l * r21) / 2.0,
        (y1 + y2 + y21 / l * r21) / 2.0,
        (l + r1 + r2) / 2.0,
    )
}

fn enclose_basis3(a: &Circle, b: &Circle, c: &Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    if ab.abs() <= f64::EPSILON {
        // Collinear centers: the pairwise enclosure of the outer two is enough.
        let pair = enclose_basis2(a, b);
        return if encloses_weak(&pair, c) { pair } else { bounding_fallback(&[*a, *b, *c]) };
    }
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).max(0.0).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle::new(x1 + xa + xb * r, y1 + ya + yb * r, r)
}

/// Circle around the mean center reaching the farthest rim. Not minimal,
/// but always encloses.
fn bounding_fallback(circles: &[Circle]) -> Circle {
    if circles.is_empty() {
        return Circle::default();
    }
    let n = circles.len() as f64;
    let cx = circles.iter().map(|c| c.x).sum::<f64>() / n;
    let cy = circles.iter().map(|c| c.y).sum::<f64>() / n;
    let r = circles
        .iter()
        .map(|c| (c.x - cx).hypot(c.y - cy) + c.r)
        .fold(0.0, f64::max);
    Circle::new(cx, cy, r)
}
