//! Whole-document cases: where supplementary characters are escaped and where
//! they are left alone.

use core::time::Duration;

use rstest::*;

use crate::escape_str;

#[rstest]
#[case::single_quoted_attribute("<elem attr='\u{1F602}'/>", "<elem attr='&#128514;'/>")]
#[case::double_quoted_attribute("<a b=\"\u{1F602}\">", "<a b=\"&#128514;\">")]
#[case::several_attributes(
    "<a b='\u{1F602}\u{1F602}' c=\"\u{1D11E}\">",
    "<a b='&#128514;&#128514;' c=\"&#119070;\">"
)]
#[case::lowest_supplementary("<a b='\u{10000}'/>", "<a b='&#65536;'/>")]
#[case::highest_supplementary("<a b='\u{10FFFF}'/>", "<a b='&#1114111;'/>")]
#[case::other_quote_inside_value(
    "<a b='\"\u{1F602}\"'/>",
    "<a b='\"&#128514;\"'/>"
)]
#[case::markup_inside_value("<a b='>\u{1F602}'/>", "<a b='>&#128514;'/>")]
#[case::attlist_default(
    "<!DOCTYPE name [<!ATTLIST name CDATA '\u{1F602}'>]><elem/>",
    "<!DOCTYPE name [<!ATTLIST name CDATA '&#128514;'>]><elem/>"
)]
#[case::attlist_double_quoted_default(
    "<!DOCTYPE n [<!ATTLIST n a CDATA \"\u{1F602}\">]><n/>",
    "<!DOCTYPE n [<!ATTLIST n a CDATA \"&#128514;\">]><n/>"
)]
#[case::element_after_doctype_comment(
    "<!DOCTYPE a [<!-- it's \u{1F602} -->]><a b='\u{1F602}'/>",
    "<!DOCTYPE a [<!-- it's \u{1F602} -->]><a b='&#128514;'/>"
)]
#[timeout(Duration::from_millis(1_000))]
fn escapes_attribute_values(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(escape_str(input), expected);
}

#[rstest]
#[case::text("<elem>\u{1F602}</elem>")]
#[case::comment("<!--\u{1F602}--><elem/>")]
#[case::comment_with_quote("<!-- a='\u{1F602}' --><elem/>")]
#[case::cdata("<![CDATA[<a b='\u{1F602}'>]]>")]
#[case::processing_instruction("<?pi a='\u{1F602}'?><a/>")]
#[case::entity_reference("&amp;\u{1F602}")]
#[case::doctype_processing_instruction("<!DOCTYPE a [<?pi '\u{1F602}'?>]><a/>")]
#[case::doctype_system_id("<!DOCTYPE name SYSTEM '\u{1F602}'><elem/>")]
#[case::doctype_public_id("<!DOCTYPE name PUBLIC \"\u{1F602}\" 'x'><elem/>")]
#[case::entity_declaration("<!DOCTYPE a [<!ENTITY e '\u{1F602}'>]><a/>")]
#[case::element_declaration("<!DOCTYPE a [<!ELEMENT a (#PCDATA)>]>\u{1F602}")]
#[case::text_after_element("<a b='x'>\u{1F602}</a>")]
#[case::basic_plane_in_attribute("<a b='\u{00E9}\u{4E2D}\u{FFFD}'/>")]
#[case::empty("")]
#[timeout(Duration::from_millis(1_000))]
fn leaves_other_content_alone(#[case] input: &str) {
    assert_eq!(escape_str(input), input);
}

#[rstest]
#[timeout(Duration::from_millis(1_000))]
fn unterminated_attribute_still_escapes() {
    assert_eq!(escape_str("<a b='\u{1F602}"), "<a b='&#128514;");
}

#[rstest]
#[timeout(Duration::from_millis(1_000))]
fn stray_closers_at_top_level_are_copied() {
    assert_eq!(escape_str("'>]]>?>-->;\u{1F602}"), "'>]]>?>-->;\u{1F602}");
}
