//! Pure numerical indicator primitives (§4.1).
//!
//! Every function here returns an array aligned 1:1 with its input series:
//! the same length, with undefined warm-up positions filled with
//! `f64::NAN` rather than being dropped. Callers index an indicator output
//! by the same bar index they used for the input close/high/low array.

/// Distinguished "undefined" marker for warm-up positions.
pub const UNDEFINED: f64 = f64::NAN;

fn nan_prefix(len: usize) -> Vec<f64> {
    vec![UNDEFINED; len]
}

/// Simple Moving Average: trailing window mean of the last `period` closes.
pub fn sma(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = nan_prefix(closes.len());
    if period == 0 || closes.len() < period {
        return out;
    }
    let mut window_sum: f64 = closes[..period].iter().sum();
    out[period - 1] = window_sum / period as f64;
    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        out[i] = window_sum / period as f64;
    }
    out
}

/// Exponential Moving Average, multiplier `2/(n+1)`, seeded with the SMA of
/// the first `period` values (§4.1).
pub fn ema(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = nan_prefix(closes.len());
    if period == 0 || closes.len() < period {
        return out;
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = closes[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    for i in period..closes.len() {
        let prev = out[i - 1];
        out[i] = (closes[i] - prev) * multiplier + prev;
    }
    out
}

/// Relative Strength Index with Wilder smoothing.
/// All-up run -> 100, all-down run -> 0 (§4.1).
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = nan_prefix(closes.len());
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    out[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        // gains[i]/losses[i] is the change feeding index i+1 of closes.
        out[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else if avg_gain == 0.0 {
        0.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// MACD: EMA(fast) - EMA(slow); signal = EMA(macd, signal); histogram =
/// macd - signal. All three outputs are aligned to the input length.
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdOutput {
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema(&macd_line, signal_period);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdOutput {
        macd: macd_line,
        signal,
        histogram,
    }
}

/// Bollinger Bands: middle = SMA(n), upper/lower = middle ± stddev·σ with
/// symmetric spread (population stddev over the same trailing window).
pub struct BollingerOutput {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(closes: &[f64], period: usize, std_devs: f64) -> BollingerOutput {
    let middle = sma(closes, period);
    let mut upper = nan_prefix(closes.len());
    let mut lower = nan_prefix(closes.len());

    if period == 0 || closes.len() < period {
        return BollingerOutput {
            middle,
            upper,
            lower,
        };
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = middle[i];
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let sigma = variance.sqrt();
        upper[i] = mean + std_devs * sigma;
        lower[i] = mean - std_devs * sigma;
    }

    BollingerOutput {
        middle,
        upper,
        lower,
    }
}

/// Average True Range: true range smoothed (Wilder-style) over `period`.
/// `true_range[i] = max(H-L, |H-prevC|, |L-prevC|)`; the first bar has no
/// previous close and uses `H-L` only.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = nan_prefix(n);
    if period == 0 || n < period {
        return out;
    }

    let mut tr = vec![0.0; n];
    tr[0] = highs[0] - lows[0];
    for i in 1..n {
        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        tr[i] = hl.max(hc).max(lc);
    }

    let seed = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    for i in period..n {
        let prev = out[i - 1];
        out[i] = (prev * (period - 1) as f64 + tr[i]) / period as f64;
    }

    out
}
