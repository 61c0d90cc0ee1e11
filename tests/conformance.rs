//! End-to-end `djot -> html` conformance scenarios, byte-exact against the
//! published fixtures.

use rstest::rstest;

#[rstest]
#[case("hello *world*!", "<p>hello <strong>world</strong>!</p>\n")]
#[case(
    "[My link text](http://example.com)",
    "<p><a href=\"http://example.com\">My link text</a></p>\n"
)]
#[case(
    "<https://example.org>\n<me@example.com>",
    "<p><a href=\"https://example.org\">https://example.org</a>\n<a href=\"mailto:me@example.com\">me@example.com</a></p>\n"
)]
#[case(
    "{key=\"value\"}\n# Header\n",
    "<section id=\"Header\">\n<h1 key=\"value\">Header</h1>\n</section>\n"
)]
#[case(
    "``Verbatim with a backtick` character``",
    "<p><code>Verbatim with a backtick` character</code></p>\n"
)]
#[case(
    "Einstein derived $`e=mc^2`.",
    "<p>Einstein derived <span class=\"math inline\">\\(e=mc^2\\)</span>.</p>\n"
)]
fn renders_the_published_fixture(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(djotters::parse_to_html(input), expected);
}
