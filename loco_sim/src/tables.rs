// Precomputed fixed-point tables.
//
// Everything the orientation solver knows about geometry comes from these
// tables; there is no floating point and no trigonometry on the tick path.
//
// - `SQRT_TABLE` + `fast_square_root()`: planar distance from a squared
//   offset. Index `k` holds `floor(sqrt(2k) * 1024)`, built at compile time.
//   Large inputs are compressed by repeated `>> 2` (each step halves the
//   root, so the output shift shrinks by one) until they fit the table.
// - `PITCH_REMAP`: maps the classifier's raw index (0..=4 climbing,
//   5..=9 descending) to the sprite pitch code. Index 5, "descending but
//   flat", collapses onto pitch 0 so level track has one sprite regardless
//   of the sign of a rounding-level height difference.
// - `YAW_TANGENTS`: `tan(m * 2.8125°) * 65536` for m = 1..=31, i.e. the
//   tangent at every half step of a 64-direction compass within one
//   quadrant. The yaw routines compare a fixed-point `dy/dx` ratio against
//   these thresholds.
//
// The exact values matter: pitch thresholds in `orientation.rs` are tuned
// against this table's rounding, and saved games replay bit-for-bit.

/// Largest squared distance looked up without compression.
pub const SQRT_TABLE_LIMIT: u32 = 4096;

/// Output shift applied to an uncompressed lookup.
const SQRT_BASE_SHIFT: u32 = 10;

const SQRT_TABLE_LEN: usize = (SQRT_TABLE_LIMIT as usize >> 1) + 1;

/// `SQRT_TABLE[k] = floor(sqrt(2k) * 1024)`.
pub static SQRT_TABLE: [u32; SQRT_TABLE_LEN] = build_sqrt_table();

const fn build_sqrt_table() -> [u32; SQRT_TABLE_LEN] {
    let mut table = [0u32; SQRT_TABLE_LEN];
    let mut k = 0;
    while k < SQRT_TABLE_LEN {
        table[k] = ((2 * k as u64) << 20).isqrt() as u32;
        k += 1;
    }
    table
}

/// Approximate `sqrt(dist_sq)` using `SQRT_TABLE`.
///
/// Never over-estimates. Odd inputs below the compression limit lose their
/// low bit to the table's stride, so `fast_square_root(1)` is 0 while
/// `fast_square_root(2)` is 1. For any `u32` the compression loop runs at
/// most ten times, which is exactly the base shift, so the final shift is
/// never negative.
pub fn fast_square_root(dist_sq: u32) -> u32 {
    let mut shift = SQRT_BASE_SHIFT;
    let mut compressed = dist_sq;
    while compressed > SQRT_TABLE_LIMIT {
        debug_assert!(shift > 0, "square root compression underflow");
        shift -= 1;
        compressed >>= 2;
    }
    SQRT_TABLE[(compressed >> 1) as usize] >> shift
}

/// Raw pitch-classifier index to sprite pitch code.
pub const PITCH_REMAP: [u8; 10] = [0, 1, 2, 3, 4, 0, 5, 6, 7, 8];

/// `YAW_TANGENTS[m - 1] = round(tan(m * 2.8125°) * 65536)`.
pub const YAW_TANGENTS: [u32; 31] = [
    3220, 6455, 9721, 13036, 16416, 19880, 23449, 27146, 30996, 35030, 39281, 43790, 48605, 53784,
    59398, 65536, 72308, 79856, 88365, 98082, 109340, 122609, 138564, 158218, 183161, 216043,
    261634, 329472, 441808, 665398, 1334016,
];
