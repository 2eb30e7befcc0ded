/// The seven tetromino kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

type Rotations = [[(i32, i32); 4]; 4];

const I_SHAPES: Rotations = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
    [(1, 0), (1, 1), (1, 2), (1, 3)],
];

const O_SHAPES: Rotations = [[(1, 0), (2, 0), (1, 1), (2, 1)]; 4];

const T_SHAPES: Rotations = [
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
];

const S_SHAPES: Rotations = [
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(1, 0), (1, 1), (2, 1), (2, 2)],
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_SHAPES: Rotations = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(2, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
];

const J_SHAPES: Rotations = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
];

const L_SHAPES: Rotations = [
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 1), (0, 2)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Cell offsets of this kind in the given rotation (0..4)
    pub fn shape(self, rotation: usize) -> [(i32, i32); 4] {
        let rotations = match self {
            PieceKind::I => &I_SHAPES,
            PieceKind::O => &O_SHAPES,
            PieceKind::T => &T_SHAPES,
            PieceKind::S => &S_SHAPES,
            PieceKind::Z => &Z_SHAPES,
            PieceKind::J => &J_SHAPES,
            PieceKind::L => &L_SHAPES,
        };
        rotations[rotation % 4]
    }
}

/// A tetromino placed on the grid. `x`/`y` is the top-left of its 4x4 box;
/// `y` may be negative while the piece is entering from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub x: i32,
    pub y: i32,
    pub rotation: usize,
}

impl Piece {
    pub const SPAWN_X: i32 = 3;
    pub const SPAWN_Y: i32 = -2;

    pub fn spawn(kind: PieceKind) -> Self {
        Piece {
            kind,
            x: Self::SPAWN_X,
            y: Self::SPAWN_Y,
            rotation: 0,
        }
    }

    /// Absolute grid cells
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (x, y) = (self.x, self.y);
        self.kind
            .shape(self.rotation)
            .into_iter()
            .map(move |(cx, cy)| (x + cx, y + cy))
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Piece {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Same position, turned a quarter clockwise
    pub fn rotated(&self) -> Self {
        Piece {
            rotation: (self.rotation + 1) % 4,
            ..*self
        }
    }
}
