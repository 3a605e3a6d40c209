macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static regex must compile"));
        &*RE
    }};
}

/// Build a catalog `Part` with only the fields a test cares about.
///
/// ```text
/// part! { id: "m1", code: Mandatory, ref_des: "ENG" }
/// ```
#[cfg(test)]
macro_rules! part {
    (
        id: $id:expr
        $(, code: $code:ident)?
        $(, number: $number:expr)?
        $(, name: $name:expr)?
        $(, remarks: $remarks:expr)?
        $(, std_remarks: $std_remarks:expr)?
        $(, ref_des: $ref_des:expr)?
        $(, preference: $preference:expr)?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut part = $crate::Part::new($id);
        $(part.functional_code = $crate::FunctionalCode::$code;)?
        $(part.part_number = $number.to_string();)?
        $(part.name = $name.to_string();)?
        $(part.remarks = $remarks.to_string();)?
        $(part.std_remarks = $std_remarks.to_string();)?
        $(part.ref_des = $ref_des.to_string();)?
        $(part.select_preference = $preference;)?
        part
    }};
}

/// Build an active `Rule` from a raw trigger expression.
#[cfg(test)]
macro_rules! rule {
    ($id:expr => $target:expr, $expr:expr) => {
        $crate::Rule::new($id, $target, $crate::parse_expression($expr))
    };
}
