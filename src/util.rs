/// 値が未設定のときだけ設定する。設定したら true を返す。
pub fn set_once<T>(opt: &mut Option<T>, x: T) -> bool {
    if opt.is_some() {
        return false;
    }
    *opt = Some(x);
    true
}

macro_rules! unwrap_or_return {
    ($option:expr, $ret:expr) => {
        match $option {
            Some(x) => x,
            None => return $ret,
        }
    };
}

macro_rules! chk {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::std::result::Result::Err($err);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_once() {
        let mut opt = None;
        assert!(set_once(&mut opt, 1));
        assert!(!set_once(&mut opt, 2));
        assert_eq!(opt, Some(1));
    }
}
