use std::{collections::HashSet, fs::File, io::Read, str::FromStr};

use anyhow::{anyhow, bail, Result};

use super::point::Point;

/// The cities of one problem instance, in input order.
#[derive(Debug)]
pub struct Problem {
    pub points: Vec<Point>,
}

pub type NomResult<I, O> = nom::IResult<I, O, nom::error::VerboseError<I>>;

impl Problem {
    fn parse(i: &str) -> NomResult<&str, Vec<Point>> {
        use nom::{
            branch::alt,
            bytes::complete::take_till1,
            character::complete::{digit1, line_ending, multispace0, space0, space1},
            combinator::{all_consuming, eof, map, map_res, verify},
            multi::count,
            number::complete::double,
            sequence::{preceded, terminated, tuple},
        };

        // Rest of the line must be blank, up to a line ending or the end of input
        fn end_of_line(i: &str) -> NomResult<&str, &str> {
            preceded(space0, alt((line_ending, eof)))(i)
        }

        // Number of cities that follow
        fn header(i: &str) -> NomResult<&str, usize> {
            terminated(
                preceded(multispace0, map_res(digit1, usize::from_str)),
                end_of_line,
            )(i)
        }

        // NaN and infinities would poison every tour cost
        fn coordinate(i: &str) -> NomResult<&str, f64> {
            verify(double, |v: &f64| v.is_finite())(i)
        }

        // "<name> <x> <y>"
        fn city(i: &str) -> NomResult<&str, Point> {
            map(
                terminated(
                    tuple((
                        preceded(space0, take_till1(|c: char| c.is_whitespace())),
                        preceded(space1, coordinate),
                        preceded(space1, coordinate),
                    )),
                    end_of_line,
                ),
                |(name, x, y)| Point::new(name, x, y),
            )(i)
        }

        let (i, n) = header(i)?;
        all_consuming(terminated(count(city, n), multispace0))(i)
    }

    pub fn try_from_str(contents: &str) -> Result<Self> {
        use nom::{
            Err::{Error, Failure},
            Offset,
        };

        let points = match Problem::parse(contents) {
            Ok((_, points)) => points,

            // The error borrows from contents, so it is rendered here.
            Err(Failure(err) | Error(err)) => {
                let mut message = String::from("Parsing failed: ");
                for (error_slice, kind) in err.errors {
                    let offset = contents.offset(error_slice);
                    let context: String = error_slice.chars().take(24).collect();
                    message += &format!("{:?} at position {}: '{}' ", kind, offset, context);
                }
                return Err(anyhow!(message.trim_end().to_string()));
            }

            // Only streaming parsers report Incomplete
            Err(nom::Err::Incomplete(_)) => unreachable!(),
        };

        if points.is_empty() {
            bail!("Problem must contain at least one city");
        }

        let mut seen = HashSet::with_capacity(points.len());
        if let Some(duplicate) = points.iter().find(|p| !seen.insert(p.id())) {
            bail!("City name '{}' appears more than once", duplicate.id());
        }

        Ok(Self { points })
    }

    pub fn try_from_file(mut file: File) -> Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::try_from_str(&contents)
    }
}
