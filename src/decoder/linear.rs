//! EAN-13/UPC-A decoding over horizontal scanlines.
//!
//! Each sampled row is binarized (adaptive sliding-window mean with a global
//! fallback), converted to run lengths, normalized to 1..=4 bar modules, and
//! matched against the EAN guard and digit patterns. The left half decodes
//! with the A/B sets (B mirrors A), the right half with C; the leading digit
//! is recovered from the A/B parity mask and the checksum validates the lot.

use super::preprocess::GrayBuffer;

/// Controls for the scanline sweep.
#[derive(Debug, Clone)]
pub struct RowScanOptions {
    /// How many rows to sample, spread evenly over the image height.
    pub scan_rows: usize,
    /// Rows narrower than this many pixels are skipped outright.
    pub min_row_pixels: usize,
}

impl Default for RowScanOptions {
    fn default() -> Self {
        Self {
            scan_rows: 15,
            min_row_pixels: 30,
        }
    }
}

/// A successful scanline decode and the row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearHit {
    pub text: String,
    pub row: usize,
}

/// Left-half A patterns as bar/space run widths, seven modules per digit.
const A_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (3, 2, 1, 1),
    (2, 2, 2, 1),
    (2, 1, 2, 2),
    (1, 4, 1, 1),
    (1, 1, 3, 2),
    (1, 2, 3, 1),
    (1, 1, 1, 4),
    (1, 3, 1, 2),
    (1, 2, 1, 3),
    (3, 1, 1, 2),
];

/// Left-half B patterns: the run-wise mirror of A.
const B_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (1, 1, 2, 3),
    (1, 2, 2, 2),
    (2, 2, 1, 2),
    (1, 1, 4, 1),
    (2, 3, 1, 1),
    (1, 3, 2, 1),
    (4, 1, 1, 1),
    (2, 1, 3, 1),
    (3, 1, 2, 1),
    (2, 1, 1, 3),
];

/// Right-half C patterns share A's run widths (color inversion does not
/// change run lengths).
const C_PATTERNS: [(u8, u8, u8, u8); 10] = A_PATTERNS;

/// Which of the six left digits use the B set, per leading digit.
const LEADING_DIGIT_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

/// Sweep evenly spaced rows of `image` for EAN-13/UPC-A symbols, top to
/// bottom.
pub fn scan(image: &GrayBuffer, opts: &RowScanOptions) -> Vec<LinearHit> {
    let mut hits = Vec::new();
    let rows = opts.scan_rows.max(1).min(image.height());
    for i in 0..rows {
        let y = if rows == 1 {
            0
        } else {
            (i * (image.height() - 1)) / (rows - 1)
        };
        if let Some(text) = decode_row(image.row(y), opts) {
            hits.push(LinearHit { text, row: y });
        }
    }
    hits
}

/// Decode one scanline. Returns 13 digits for EAN-13 or 12 for UPC-A
/// (EAN-13 with a leading zero is reported in its UPC-A form).
pub fn decode_row(row: &[u8], opts: &RowScanOptions) -> Option<String> {
    if row.len() < opts.min_row_pixels {
        return None;
    }

    // Adaptive binarization first; fall back to the global threshold when
    // the adaptive pass produces too few runs to hold a symbol.
    let modules = {
        let adaptive = binarize_adaptive(row);
        let runs = run_lengths(&adaptive);
        if runs.len() >= 40 {
            normalize_modules(&runs)
        } else {
            let global = binarize_global(row);
            let runs = run_lengths(&global);
            if runs.len() < 40 {
                return None;
            }
            normalize_modules(&runs)
        }
    };

    // Start guard: the first 1,1,1 triple in module widths.
    let start = find_start_guard(&modules)?;
    let mut idx = start + 3;

    // Left half: six digits, four runs each, each matched against both the
    // A and B sets; the closer set wins and records the parity.
    let mut left_digits = [0u8; 6];
    let mut left_uses_b = [false; 6];
    for digit in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let widths = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (a_digit, a_distance) = closest_digit(&widths, &A_PATTERNS);
        let (b_digit, b_distance) = closest_digit(&widths, &B_PATTERNS);
        if a_distance <= b_distance {
            left_digits[digit] = a_digit;
        } else {
            left_digits[digit] = b_digit;
            left_uses_b[digit] = true;
        }
        idx += 4;
    }

    // Center guard: 1,1,1,1,1.
    if !is_center_guard(&modules, idx) {
        return None;
    }
    idx += 5;

    // Right half: six digits from the C set.
    let mut right_digits = [0u8; 6];
    for digit in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let widths = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (c_digit, _) = closest_digit(&widths, &C_PATTERNS);
        right_digits[digit] = c_digit;
        idx += 4;
    }

    // End guard: 1,1,1.
    if !is_end_guard(&modules, idx) {
        return None;
    }

    let leading = leading_digit(&left_uses_b)?;
    let mut digits = [0u8; 13];
    digits[0] = leading;
    digits[1..7].copy_from_slice(&left_digits);
    digits[7..13].copy_from_slice(&right_digits);

    if !checksum_valid(&digits) {
        return None;
    }

    let rendered: String = if digits[0] == 0 {
        digits[1..].iter().map(|d| char::from(b'0' + d)).collect()
    } else {
        digits.iter().map(|d| char::from(b'0' + d)).collect()
    };
    Some(rendered)
}

/// Global threshold mixing the row mean with the min/max midpoint. Fast,
/// but weak against lighting gradients.
fn binarize_global(row: &[u8]) -> Vec<bool> {
    let (mut min_v, mut max_v) = (u8::MAX, 0u8);
    let mut sum = 0u64;
    for &v in row {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += u64::from(v);
    }
    let mean = (sum / row.len() as u64) as u16;
    let mid = (u16::from(min_v) + u16::from(max_v)) / 2;
    let threshold = ((mean + mid) / 2) as u8;
    row.iter().map(|&v| v < threshold).collect()
}

/// Sliding-window mean threshold with a small dark bias. Window defaults to
/// width/32 clamped into [8, 64].
fn binarize_adaptive(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }
    let window = (n / 32).clamp(8, 64);
    let bias = 5i32;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0u32);
    for &v in row {
        let last = *prefix.last().unwrap_or(&0);
        prefix.push(last + u32::from(v));
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let left = i.saturating_sub(window);
        let right = (i + window).min(n - 1);
        let len = (right - left + 1) as u32;
        let mean = ((prefix[right + 1] - prefix[left]) / len) as i32;
        out.push(i32::from(row[i]) < mean - bias);
    }
    out
}

/// Collapse a binary row into consecutive run lengths.
fn run_lengths(row: &[bool]) -> Vec<usize> {
    let mut runs = Vec::new();
    let Some(&first) = row.first() else {
        return runs;
    };
    let mut current = first;
    let mut length = 1usize;
    for &bar in &row[1..] {
        if bar == current {
            length += 1;
        } else {
            runs.push(length);
            current = bar;
            length = 1;
        }
    }
    runs.push(length);
    runs
}

/// Normalize run lengths to 1..=4 bar modules. The unit width is estimated
/// from the lower quartile, which stays robust when wide quiet zones skew
/// the distribution.
fn normalize_modules(runs: &[usize]) -> Vec<u8> {
    if runs.is_empty() {
        return Vec::new();
    }
    let mut sorted = runs.to_vec();
    sorted.sort_unstable();
    let unit = sorted[sorted.len() / 4].max(1);
    runs.iter()
        .map(|&width| (((width + unit / 2) / unit).clamp(1, 4)) as u8)
        .collect()
}

fn find_start_guard(modules: &[u8]) -> Option<usize> {
    (0..modules.len().saturating_sub(2))
        .find(|&i| modules[i] == 1 && modules[i + 1] == 1 && modules[i + 2] == 1)
}

fn is_center_guard(modules: &[u8], i: usize) -> bool {
    i + 4 < modules.len() && modules[i..=i + 4].iter().all(|&m| m == 1)
}

fn is_end_guard(modules: &[u8], i: usize) -> bool {
    i + 2 < modules.len() && modules[i..=i + 2].iter().all(|&m| m == 1)
}

/// Closest digit by Manhattan distance over the four run widths.
fn closest_digit(widths: &(u8, u8, u8, u8), table: &[(u8, u8, u8, u8); 10]) -> (u8, u32) {
    let mut best_distance = u32::MAX;
    let mut best_digit = 0u8;
    for (digit, &candidate) in table.iter().enumerate() {
        let distance = width_distance(*widths, candidate);
        if distance < best_distance {
            best_distance = distance;
            best_digit = digit as u8;
        }
    }
    (best_digit, best_distance)
}

fn width_distance(p: (u8, u8, u8, u8), q: (u8, u8, u8, u8)) -> u32 {
    let d = |a: u8, b: u8| u32::from(a.abs_diff(b));
    d(p.0, q.0) + d(p.1, q.1) + d(p.2, q.2) + d(p.3, q.3)
}

fn leading_digit(uses_b: &[bool; 6]) -> Option<u8> {
    LEADING_DIGIT_MASKS
        .iter()
        .position(|mask| mask == uses_b)
        .map(|digit| digit as u8)
}

fn checksum_valid(digits: &[u8; 13]) -> bool {
    let mut sum = 0u32;
    for (i, &digit) in digits[..12].iter().enumerate() {
        let weight = if i % 2 == 0 { 1 } else { 3 };
        sum += u32::from(digit) * weight;
    }
    (10 - sum % 10) % 10 == u32::from(digits[12])
}

/// Render an ideal scanline for a digit string, `unit` pixels per module.
/// Accepts 13 digits (EAN-13) or 12 (UPC-A); the final check digit is
/// recomputed either way. Intended for demos and tests.
pub fn synthesize_row(digits: &str, unit: usize) -> Vec<u8> {
    let input: Vec<u8> = digits.bytes().map(|c| c.wrapping_sub(b'0')).collect();
    let mut ean13 = [0u8; 13];
    if input.len() == 12 {
        ean13[1..13].copy_from_slice(&input);
    } else {
        ean13[..input.len().min(13)].copy_from_slice(&input[..input.len().min(13)]);
    }
    let mut sum = 0u32;
    for (i, &digit) in ean13[..12].iter().enumerate() {
        let weight = if i % 2 == 0 { 1 } else { 3 };
        sum += u32::from(digit) * weight;
    }
    ean13[12] = ((10 - sum % 10) % 10) as u8;

    let mask = LEADING_DIGIT_MASKS[ean13[0] as usize];

    // Module widths, starting with a white quiet zone and alternating color
    // with every run.
    let mut modules: Vec<u8> = vec![9];
    modules.extend([1, 1, 1]);
    for (i, &digit) in ean13[1..7].iter().enumerate() {
        let (a, b, c, d) = if mask[i] {
            B_PATTERNS[digit as usize]
        } else {
            A_PATTERNS[digit as usize]
        };
        modules.extend([a, b, c, d]);
    }
    modules.extend([1, 1, 1, 1, 1]);
    for &digit in &ean13[7..13] {
        let (a, b, c, d) = C_PATTERNS[digit as usize];
        modules.extend([a, b, c, d]);
    }
    modules.extend([1, 1, 1]);
    modules.push(9);

    let mut pixels = Vec::new();
    let mut black = false;
    for width in modules {
        let value = if black { 0u8 } else { 255u8 };
        pixels.extend(std::iter::repeat(value).take(width as usize * unit));
        black = !black;
    }
    pixels
}
