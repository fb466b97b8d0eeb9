//! Reference hexahedron: corner numbering, faces and edge lines.
//!
//! Corner `i + 2j + 4k` sits at logical position `(i, j, k)`. Face
//! `2 * dir + side` is the side `side` (0 or 1) of direction `dir`; its four
//! corners are listed as a cycle. The four edge lines of a direction join a
//! corner with `bit(dir) == 0` to the one with the bit set.

/// Corners of each face, as a cycle.
pub const FACE_CORNERS: [[usize; 4]; 6] = [
    [4, 0, 2, 6],
    [5, 1, 3, 7],
    [4, 0, 1, 5],
    [6, 2, 3, 7],
    [2, 0, 1, 3],
    [6, 4, 5, 7],
];

/// Edge lines along each direction, `(low corner, high corner)`.
pub const EDGE_LINES: [[(usize, usize); 4]; 3] = [
    [(0, 1), (2, 3), (4, 5), (6, 7)],
    [(0, 2), (1, 3), (4, 6), (5, 7)],
    [(0, 4), (1, 5), (2, 6), (3, 7)],
];

/// Corner index of logical position `(i, j, k)`.
#[inline]
pub const fn corner(i: usize, j: usize, k: usize) -> usize {
    i + 2 * j + 4 * k
}

/// Logical position of a corner.
#[inline]
pub const fn corner_position(c: usize) -> [usize; 3] {
    [c & 1, (c >> 1) & 1, (c >> 2) & 1]
}

#[inline]
pub const fn face_index(dir: usize, side: usize) -> usize {
    2 * dir + side
}

/// `(dir, side)` of a face index.
#[inline]
pub const fn face_dir_side(face: usize) -> (usize, usize) {
    (face / 2, face % 2)
}

/// Corner reached from `c` by flipping direction `dir`.
#[inline]
pub const fn flip(c: usize, dir: usize) -> usize {
    c ^ (1 << dir)
}

/// `true` when corner `c` lies on face `face`.
#[inline]
pub const fn is_on_face(c: usize, face: usize) -> bool {
    let (dir, side) = face_dir_side(face);
    corner_position(c)[dir] == side
}

/// Direction of the line joining two corners, `None` unless they differ in
/// exactly one bit.
pub fn line_direction(a: usize, b: usize) -> Option<usize> {
    let x = a ^ b;
    match x {
        1 => Some(0),
        2 => Some(1),
        4 => Some(2),
        _ => None,
    }
}

/// Faces holding the line `(a, b)`.
pub fn faces_of_line(a: usize, b: usize) -> Vec<usize> {
    (0..6).filter(|&f| is_on_face(a, f) && is_on_face(b, f)).collect()
}

/// The two directions other than `dir`.
#[inline]
pub const fn other_dirs(dir: usize) -> [usize; 2] {
    match dir {
        0 => [1, 2],
        1 => [0, 2],
        _ => [0, 1],
    }
}
