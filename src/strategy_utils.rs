use crate::models::{Direction, OrderDirective};

/// Close every open position in the asset
pub fn close_order() -> OrderDirective {
    OrderDirective::Close
}

/// Open or add to a long position of `size` units
pub fn long_order(size: f64) -> OrderDirective {
    OrderDirective::Open {
        direction: Direction::Long,
        size: size.abs(),
    }
}

/// Open or add to a short position of `size` units
pub fn short_order(size: f64) -> OrderDirective {
    OrderDirective::Open {
        direction: Direction::Short,
        size: size.abs(),
    }
}
