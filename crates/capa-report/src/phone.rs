/// A phone number can be @-mentioned iff it is 10 to 15 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    (10..=15).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
}
