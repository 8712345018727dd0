// Define the CandleType enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleType {
    Bullish,
    Bearish,
}

// A single OHLC bar, as supplied by the host price series
#[derive(Debug, Clone)]
pub struct Candle {
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
}

// Implement methods for the Candle struct
impl Candle {
    // A constructor for convenience
    pub fn new(open_price: f64, high_price: f64, low_price: f64, close_price: f64) -> Self {
        Candle {
            open_price,
            high_price,
            low_price,
            close_price,
        }
    }

    // A method to determine the type of candle
    pub fn get_type(&self) -> CandleType {
        if self.close_price >= self.open_price {
            CandleType::Bullish
        } else {
            CandleType::Bearish
        }
    }

    // Returns the low and high of the candle body as a tuple
    pub fn body_range(&self) -> (f64, f64) {
        match self.get_type() {
            CandleType::Bullish => (self.open_price, self.close_price),
            CandleType::Bearish => (self.close_price, self.open_price),
        }
    }
}
