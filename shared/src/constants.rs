pub const LOSS_CHANCE: f64 = 0.10;
pub const LOSS_PERCENTAGE: f64 = -10.0;
pub const MIN_PROFIT_PERCENT: f64 = 20.0;
pub const MAX_PROFIT_PERCENT: f64 = 200.0;

pub const SECTOR_MARGIN_DEGREES: f64 = 2.0;
pub const POINTER_ANGLE_DEGREES: f64 = 90.0;

pub const FLAIR_TIERS: [f64; 3] = [5.0, 10.0, 15.0];

pub const NEGATIVE_INVESTMENT_ERROR: &str = "Investment cannot be negative";
pub const INVALID_FLAIR_ERROR: &str = "Narrative flair must be one of the offered tiers";
pub const MALFORMED_NUMBER_ERROR: &str = "Please enter a valid number of gold pieces";

// Constants for frontend animation
pub const MIN_EXTRA_SPINS: u32 = 4;     // Minimum number of extra full rotations
pub const MAX_EXTRA_SPINS: u32 = 7;     // Maximum number of extra full rotations
pub const SPIN_DURATION_MS: u32 = 4000; // Duration of spin animation in milliseconds
