use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
	static ref VALID_ID_REGEX: Regex = Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").unwrap();
}

/// Checks if given name can be used for a generator, function or variable
pub(super) fn is_name_valid(name: &str) -> bool {
	VALID_ID_REGEX.is_match(name)
}

/// Checks if a constant value is representable with the given width and signedness
pub(super) fn constant_fits(value: i64, width: u32, signed: bool) -> bool {
	if width == 0 {
		return false;
	}

	if width >= 64 {
		return signed || value >= 0;
	}

	let value = value as i128;
	if signed {
		let limit = 1i128 << (width - 1);
		value >= -limit && value < limit
	}
	else {
		value >= 0 && value < (1i128 << width)
	}
}

/// Returns the smallest width able to hold the value
pub(super) fn min_width(value: i64) -> u32 {
	if value < 0 {
		65 - (!value).leading_zeros().min(64)
	}
	else {
		(64 - value.leading_zeros()).max(1)
	}
}
