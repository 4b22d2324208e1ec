//! The fixed extraction prompt and the signal check applied to its answer.

/// Token the model is told to return when the image holds no signal.
pub const NO_SIGNAL_MARKER: &str = "NO_SIGNAL_FOUND";

/// Prompt sent ahead of every image. Not user-configurable.
pub const SIGNAL_EXTRACTION_PROMPT: &str = "
Analyze this trading signal image and extract the following information if present:
- Symbol (e.g., XAUUSD, EURUSD, GOLD, etc.)
- Action (BUY or SELL)
- Entry price or entry zone (range)
- Stop Loss (SL)
- Take Profit levels (TP1, TP2, TP3, etc.)

Return ONLY the extracted text in a simple format like:
SYMBOL ACTION @ ENTRY
SL: [value]
TP1: [value]
TP2: [value]
...

If no trading signal is found in the image, return: NO_SIGNAL_FOUND

Be concise. Return only the signal data, no explanations.
";

/// A reply counts as a signal unless it mentions the marker anywhere.
pub fn is_signal(extracted_text: &str) -> bool {
    !extracted_text.contains(NO_SIGNAL_MARKER)
}
